//! STRIKE Stroke Risk Calculator
//!
//! This library collects six patient risk factors, encodes them the way the
//! STRIKE gradient boosting model was trained, and reports the predicted
//! one-year stroke probability together with a compounded ten-year estimate.
//!
//! # Modules
//!
//! - [`data`] - Widget contracts, categorical label tables and patient records
//! - [`features`] - Encoding of form inputs into a named feature row
//! - [`models`] - Boosted tree model loading, prediction and risk formatting
//! - [`web`] - Single-page HTML form and JSON API
//! - [`config`] - Application configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use strike_risk::data::FormInputs;
//! use strike_risk::features::encode;
//! use strike_risk::models::{predict, ModelStore};
//!
//! fn main() -> anyhow::Result<()> {
//!     // 1. Load the trained model once
//!     let store = ModelStore::new("strike_model.json");
//!     let model = store.get()?;
//!
//!     // 2. Encode the form inputs
//!     let inputs = FormInputs {
//!         sex: "Male".to_string(),
//!         ..FormInputs::default()
//!     };
//!     let features = encode(&inputs)?;
//!
//!     // 3. Predict
//!     let result = predict(model.as_ref(), &features)?;
//!     println!("1-year: {}  10-year: {}", result.one_year_display(), result.ten_year_display());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod features;
pub mod models;
pub mod web;

// Re-export commonly used items at the crate level
pub use config::AppConfig;
pub use data::{FormInputs, PatientFeatures};
pub use features::{encode, EncodingError, FeatureRow};
pub use models::{predict, Booster, ModelError, ModelStore, PredictionResult, RiskPredictor};
pub use web::{app, AppState};
