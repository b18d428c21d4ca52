//! Encoding of form inputs into model features
//!
//! This module turns raw widget state into the integer record the model was
//! trained on, and lays that record out as a named single-row table.

use crate::data::{Categorical, Diabetes, FormInputs, PatientFeatures, Sex, SliderSpec, Smoking};
use crate::data::{AGE, DBP, SBP};
use ndarray::{Array2, ArrayView1};
use thiserror::Error;

/// Column names the model was fit on, in canonical order
pub const FEATURE_COLUMNS: [&str; 6] = ["age", "dbp", "sbp", "diabetes", "sex", "smoking"];

/// Errors that can occur while encoding form inputs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Unrecognized category for {field}: {label:?} (expected one of {expected:?})")]
    UnrecognizedCategory {
        field: &'static str,
        label: String,
        expected: Vec<&'static str>,
    },

    #[error("{field} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("Invalid feature row: {0}")]
    InvalidRow(String),

    #[error("Feature row has no column {0:?}")]
    MissingColumn(String),
}

fn lookup<C: Categorical>(label: &str) -> Result<C, EncodingError> {
    C::from_label(label).ok_or_else(|| EncodingError::UnrecognizedCategory {
        field: C::FIELD,
        label: label.to_string(),
        expected: C::labels(),
    })
}

fn bounded(spec: &SliderSpec, value: i32) -> Result<i32, EncodingError> {
    if spec.contains(value) {
        Ok(value)
    } else {
        Err(EncodingError::OutOfRange {
            field: spec.name,
            value,
            min: spec.min,
            max: spec.max,
        })
    }
}

/// Map raw widget values to the encoded patient record.
///
/// Pure: the same inputs always give the same record. Labels must match the
/// select options exactly; nothing falls back to a default code.
pub fn encode(inputs: &FormInputs) -> Result<PatientFeatures, EncodingError> {
    Ok(PatientFeatures {
        age: bounded(&AGE, inputs.age)?,
        sex: lookup::<Sex>(&inputs.sex)?.code(),
        sbp: bounded(&SBP, inputs.sbp)?,
        dbp: bounded(&DBP, inputs.dbp)?,
        diabetes: lookup::<Diabetes>(&inputs.diabetes)?.code(),
        smoking: lookup::<Smoking>(&inputs.smoking)?.code(),
    })
}

/// Single-row feature table with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Array2<f32>,
}

impl FeatureRow {
    /// Build a row from column names and values
    pub fn new(columns: Vec<String>, values: Vec<f32>) -> Result<Self, EncodingError> {
        if columns.len() != values.len() {
            return Err(EncodingError::InvalidRow(format!(
                "{} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(EncodingError::InvalidRow(format!(
                    "duplicate column {:?}",
                    name
                )));
            }
        }

        let n = values.len();
        let values = Array2::from_shape_vec((1, n), values)
            .map_err(|e| EncodingError::InvalidRow(e.to_string()))?;

        Ok(Self { columns, values })
    }

    /// Column names in storage order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in storage order
    pub fn values(&self) -> ArrayView1<'_, f32> {
        self.values.row(0)
    }

    /// Value of a column by name
    pub fn get(&self, name: &str) -> Option<f32> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[[0, i]])
    }

    /// Values laid out in the requested column order.
    ///
    /// Fails on the first requested name missing from the row.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<f32>, EncodingError> {
        names
            .iter()
            .map(|n| {
                self.get(n.as_ref())
                    .ok_or_else(|| EncodingError::MissingColumn(n.as_ref().to_string()))
            })
            .collect()
    }
}

impl From<&PatientFeatures> for FeatureRow {
    fn from(f: &PatientFeatures) -> Self {
        let values = vec![
            f.age as f32,
            f.dbp as f32,
            f.sbp as f32,
            f.diabetes as f32,
            f.sex as f32,
            f.smoking as f32,
        ];
        Self {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            values: Array2::from_shape_fn((1, values.len()), |(_, j)| values[j]),
        }
    }
}
