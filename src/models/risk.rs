//! Stroke risk results and presentation helpers

use crate::data::PatientFeatures;
use serde::Serialize;

/// Number of years the one-year risk is compounded over
pub const EXTRAPOLATION_YEARS: i32 = 10;

/// Caveat shown next to the ten-year figure
pub const EXTRAPOLATION_NOTE: &str = "The 10-year risk is estimated by compounding the predicted \
1-year risk: 1 - (1 - p)^10. This assumes the annual risk stays constant and is independent \
from one year to the next. It is a simplification, not a validated multi-year model, and is \
not a substitute for longitudinal risk scores such as Framingham.";

/// Ten-year risk from a one-year risk, assuming a constant, independent
/// annual probability.
pub fn ten_year_risk(one_year: f64) -> f64 {
    1.0 - (1.0 - one_year).powi(EXTRAPOLATION_YEARS)
}

/// Format a probability as a percentage with two decimals, e.g. `0.05` -> `"5.00%"`
pub fn format_percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Outcome of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Encoded inputs the model saw
    pub features: PatientFeatures,
    /// Predicted probability of stroke within one year
    pub one_year: f64,
    /// Compounded ten-year probability
    pub ten_year: f64,
}

impl PredictionResult {
    /// Build a result from a model probability
    pub fn from_probability(features: PatientFeatures, one_year: f64) -> Self {
        Self {
            features,
            one_year,
            ten_year: ten_year_risk(one_year),
        }
    }

    /// One-year risk as shown to the user
    pub fn one_year_display(&self) -> String {
        format_percent(self.one_year)
    }

    /// Ten-year risk as shown to the user
    pub fn ten_year_display(&self) -> String {
        format_percent(self.ten_year)
    }
}
