//! Machine learning models module
//!
//! This module provides:
//! - Loading and evaluating a trained gradient boosted tree model
//! - The prediction entry point and load-once model handle
//! - Ten-year risk extrapolation and display formatting

pub mod booster;
pub mod predictor;
pub mod risk;

pub use booster::{Booster, ModelError, ModelSummary};
pub use predictor::{predict, ModelStore, RiskPredictor};
pub use risk::{
    format_percent, ten_year_risk, PredictionResult, EXTRAPOLATION_NOTE, EXTRAPOLATION_YEARS,
};
