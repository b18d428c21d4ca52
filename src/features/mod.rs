//! Feature encoding module
//!
//! This module provides:
//! - Categorical label to integer encoding
//! - The named single-row feature table handed to the model

pub mod encoding;

pub use encoding::{encode, EncodingError, FeatureRow, FEATURE_COLUMNS};
