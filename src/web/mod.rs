//! Web surface for the risk calculator
//!
//! This module provides:
//! - The single-page HTML form (`GET /`, `POST /predict`)
//! - A JSON prediction endpoint (`POST /api/predict`)
//! - A health check (`GET /health`)

pub mod handlers;
pub mod page;

use crate::models::{ModelSummary, RiskPredictor};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tera::Tera;

pub use handlers::{AppError, PredictResponse};
pub use page::FormState;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn RiskPredictor>,
    pub templates: Arc<Tera>,
    pub summary: Option<Arc<ModelSummary>>,
}

impl AppState {
    /// Create state around a loaded predictor
    pub fn new(predictor: Arc<dyn RiskPredictor>) -> Result<Self, tera::Error> {
        Ok(Self {
            predictor,
            templates: Arc::new(page::templates()?),
            summary: None,
        })
    }

    /// Attach a model description for the health endpoint
    pub fn with_summary(mut self, summary: ModelSummary) -> Self {
        self.summary = Some(Arc::new(summary));
        self
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::submit))
        .route("/api/predict", post(handlers::api_predict))
        .route("/health", get(handlers::health))
        .with_state(state)
}
