//! Prediction entry point and the shared model handle

use crate::data::PatientFeatures;
use crate::features::FeatureRow;
use crate::models::booster::{Booster, ModelError};
use crate::models::risk::PredictionResult;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Anything that maps one feature row to a one-year stroke probability
pub trait RiskPredictor: Send + Sync {
    /// Predict a single row
    fn predict_one(&self, row: &FeatureRow) -> Result<f64, ModelError>;
}

impl RiskPredictor for Booster {
    fn predict_one(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        self.predict_row(row)
    }
}

/// Run the model on one patient and derive the ten-year figure.
///
/// Outputs that are not a probability are reported as failures rather than
/// clamped.
pub fn predict<P: RiskPredictor + ?Sized>(
    predictor: &P,
    features: &PatientFeatures,
) -> Result<PredictionResult, ModelError> {
    let row = FeatureRow::from(features);
    let p1 = predictor.predict_one(&row)?;

    if !p1.is_finite() || !(0.0..=1.0).contains(&p1) {
        warn!("Model returned {} for {:?}", p1, features);
        return Err(ModelError::PredictionFailed(format!(
            "model output {p1} is not a probability"
        )));
    }

    let result = PredictionResult::from_probability(*features, p1);
    debug!(
        "Predicted one-year risk {:.4}, ten-year {:.4}",
        result.one_year, result.ten_year
    );
    Ok(result)
}

/// Read-only model loaded from disk at most once per process
#[derive(Debug)]
pub struct ModelStore {
    path: PathBuf,
    model: OnceLock<Arc<Booster>>,
}

impl ModelStore {
    /// Create a handle for the model at `path` without loading it
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            model: OnceLock::new(),
        }
    }

    /// Path the model is read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the model has been loaded yet
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// The loaded model, reading it from disk on first use.
    ///
    /// A failed load is not cached; the next call tries again.
    pub fn get(&self) -> Result<Arc<Booster>, ModelError> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        info!("Loading model from {}", self.path.display());
        let booster = Arc::new(Booster::load(&self.path)?);
        Ok(Arc::clone(self.model.get_or_init(|| booster)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FormInputs;
    use crate::features::encode;

    struct Fixed(f64);

    impl RiskPredictor for Fixed {
        fn predict_one(&self, _row: &FeatureRow) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    fn reference_features() -> PatientFeatures {
        encode(&FormInputs {
            sex: "Male".to_string(),
            ..FormInputs::default()
        })
        .unwrap()
    }

    #[test]
    fn test_predict_derives_ten_year() {
        let result = predict(&Fixed(0.05), &reference_features()).unwrap();
        assert_eq!(result.one_year_display(), "5.00%");
        assert_eq!(result.ten_year_display(), "40.13%");
        assert_eq!(result.features.sex, 1);
    }

    #[test]
    fn test_predict_rejects_non_probability() {
        for bad in [f64::NAN, -0.1, 1.5, f64::INFINITY] {
            let err = predict(&Fixed(bad), &reference_features()).unwrap_err();
            assert!(matches!(err, ModelError::PredictionFailed(_)));
        }
    }

    #[test]
    fn test_predict_is_deterministic() {
        let booster =
            Booster::from_json_str(include_str!("../../tests/fixtures/strike_model.json")).unwrap();
        let features = reference_features();

        let first = predict(&booster, &features).unwrap();
        let second = predict(&booster, &features).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_store_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strike_model.json");
        std::fs::write(&path, include_str!("../../tests/fixtures/strike_model.json")).unwrap();

        let store = ModelStore::new(&path);
        assert_eq!(store.path(), path.as_path());
        assert!(!store.is_loaded());

        let first = store.get().unwrap();
        // Later calls must not touch the file again
        std::fs::remove_file(&path).unwrap();
        let second = store.get().unwrap();

        assert!(store.is_loaded());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_store_missing_file() {
        let store = ModelStore::new("/nonexistent/strike_model.json");
        assert!(matches!(store.get(), Err(ModelError::Io { .. })));
        assert!(!store.is_loaded());
    }
}
