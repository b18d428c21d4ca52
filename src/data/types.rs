//! Data types for patient risk factors
//!
//! This module defines the form inputs, the categorical label tables and the
//! encoded feature record used throughout the project.

use serde::{Deserialize, Serialize};

/// Integer slider contract (inclusive bounds plus initial position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliderSpec {
    /// Field name as used by the model
    pub name: &'static str,
    /// Label shown next to the slider
    pub label: &'static str,
    /// Lowest selectable value
    pub min: i32,
    /// Highest selectable value
    pub max: i32,
    /// Initial position
    pub default: i32,
}

impl SliderSpec {
    /// Check whether a value lies within the slider bounds
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Age in years
pub const AGE: SliderSpec = SliderSpec {
    name: "age",
    label: "Age",
    min: 18,
    max: 100,
    default: 60,
};

/// Systolic blood pressure in mmHg
pub const SBP: SliderSpec = SliderSpec {
    name: "sbp",
    label: "Systolic Blood Pressure (SBP)",
    min: 80,
    max: 220,
    default: 120,
};

/// Diastolic blood pressure in mmHg
pub const DBP: SliderSpec = SliderSpec {
    name: "dbp",
    label: "Diastolic Blood Pressure (DBP)",
    min: 40,
    max: 140,
    default: 80,
};

/// Closed set of labels backed by a fixed integer code.
///
/// Every select widget on the form is driven by one of these tables, so the
/// options shown to the user and the codes fed to the model cannot drift.
pub trait Categorical: Sized + Copy + 'static {
    /// Field name as used by the model
    const FIELD: &'static str;
    /// All variants in display order
    const ALL: &'static [Self];

    /// Display label
    fn label(self) -> &'static str;

    /// Integer code expected by the model
    fn code(self) -> i32;

    /// Look up a variant by its exact display label
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == label)
    }

    /// Display labels in order
    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.label()).collect()
    }
}

/// Biological sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Categorical for Sex {
    const FIELD: &'static str = "sex";
    const ALL: &'static [Self] = &[Sex::Female, Sex::Male];

    fn label(self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }

    fn code(self) -> i32 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
        }
    }
}

/// Diabetes diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diabetes {
    No,
    Yes,
}

impl Categorical for Diabetes {
    const FIELD: &'static str = "diabetes";
    const ALL: &'static [Self] = &[Diabetes::No, Diabetes::Yes];

    fn label(self) -> &'static str {
        match self {
            Diabetes::No => "No",
            Diabetes::Yes => "Yes",
        }
    }

    fn code(self) -> i32 {
        match self {
            Diabetes::No => 0,
            Diabetes::Yes => 1,
        }
    }
}

/// Smoking history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Smoking {
    Never,
    Former,
    Current,
}

impl Categorical for Smoking {
    const FIELD: &'static str = "smoking";
    const ALL: &'static [Self] = &[Smoking::Never, Smoking::Former, Smoking::Current];

    fn label(self) -> &'static str {
        match self {
            Smoking::Never => "Never",
            Smoking::Former => "Former",
            Smoking::Current => "Current",
        }
    }

    fn code(self) -> i32 {
        match self {
            Smoking::Never => 0,
            Smoking::Former => 1,
            Smoking::Current => 2,
        }
    }
}

/// Raw widget state as submitted by the form.
///
/// Categorical fields stay as labels here; [`crate::features::encode`] turns
/// them into codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInputs {
    pub age: i32,
    pub sex: String,
    pub sbp: i32,
    pub dbp: i32,
    pub diabetes: String,
    pub smoking: String,
}

impl Default for FormInputs {
    fn default() -> Self {
        Self {
            age: AGE.default,
            sex: Sex::Female.label().to_string(),
            sbp: SBP.default,
            dbp: DBP.default,
            diabetes: Diabetes::No.label().to_string(),
            smoking: Smoking::Never.label().to_string(),
        }
    }
}

/// Encoded patient record, one row of model input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientFeatures {
    /// Age in years
    pub age: i32,
    /// 0 = female, 1 = male
    pub sex: i32,
    /// Systolic blood pressure (mmHg)
    pub sbp: i32,
    /// Diastolic blood pressure (mmHg)
    pub dbp: i32,
    /// 0 = no, 1 = yes
    pub diabetes: i32,
    /// 0 = never, 1 = former, 2 = current
    pub smoking: i32,
}
