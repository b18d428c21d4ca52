//! HTTP handlers for the risk form and its JSON counterpart

use crate::data::{FormInputs, PatientFeatures};
use crate::features::{encode, EncodingError};
use crate::models::{predict, ModelError, ModelSummary, PredictionResult};
use crate::web::page::{self, FormState};
use crate::web::AppState;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors surfaced by the web layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid form submission: {}", .0.body_text())]
    Form(#[from] FormRejection),

    #[error("Invalid JSON body: {}", .0.body_text())]
    Json(#[from] JsonRejection),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Encoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Form(r) => r.status(),
            AppError::Json(r) => r.status(),
            AppError::Model(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// JSON prediction response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub features: PatientFeatures,
    pub one_year_risk: f64,
    pub ten_year_risk: f64,
    pub one_year_display: String,
    pub ten_year_display: String,
}

impl From<PredictionResult> for PredictResponse {
    fn from(r: PredictionResult) -> Self {
        Self {
            features: r.features,
            one_year_risk: r.one_year,
            ten_year_risk: r.ten_year,
            one_year_display: r.one_year_display(),
            ten_year_display: r.ten_year_display(),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model: Option<ModelSummary>,
}

fn run(state: &AppState, inputs: &FormInputs) -> Result<PredictionResult, AppError> {
    let features = encode(inputs)?;
    let result = predict(state.predictor.as_ref(), &features)?;
    info!(
        "Prediction for {:?}: {}",
        features,
        result.one_year_display()
    );
    Ok(result)
}

/// `GET /` renders the empty form
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = page::render(
        &state.templates,
        &FormInputs::default(),
        &FormState::AwaitingInput,
        None,
    )?;
    Ok(Html(html))
}

/// Re-render the form with an error message and no result
fn render_error(state: &AppState, inputs: &FormInputs, e: AppError) -> Result<Response, AppError> {
    warn!("Prediction failed: {}", e);
    let message = e.to_string();
    let html = page::render(
        &state.templates,
        inputs,
        &FormState::AwaitingInput,
        Some(&message),
    )?;
    Ok((e.status(), Html(html)).into_response())
}

/// `POST /predict` runs the model on the submitted widgets and re-renders the form
///
/// A body that does not decode into the widget values still gets the page
/// back, with the default widgets and the decoding error.
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Form<FormInputs>, FormRejection>,
) -> Result<Response, AppError> {
    let inputs = match payload {
        Ok(Form(inputs)) => inputs,
        Err(rejection) => return render_error(&state, &FormInputs::default(), rejection.into()),
    };

    match run(&state, &inputs) {
        Ok(result) => {
            let html = page::render(
                &state.templates,
                &inputs,
                &FormState::ResultDisplayed(result),
                None,
            )?;
            Ok(Html(html).into_response())
        }
        Err(e) => render_error(&state, &inputs, e),
    }
}

/// `POST /api/predict` is the JSON form of the same pipeline
pub async fn api_predict(
    State(state): State<AppState>,
    payload: Result<Json<FormInputs>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(inputs) = payload?;
    let result = run(&state, &inputs)?;
    Ok(Json(result.into()))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.summary.as_deref().cloned(),
    })
}
