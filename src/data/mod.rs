//! Data module for patient inputs
//!
//! This module provides:
//! - Slider and select widget contracts
//! - Categorical label tables (sex, diabetes, smoking)
//! - The encoded patient feature record

pub mod types;

pub use types::{
    Categorical, Diabetes, FormInputs, PatientFeatures, Sex, SliderSpec, Smoking, AGE, DBP, SBP,
};
