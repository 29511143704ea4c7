//! Patient attribute types for diabetes risk screening.
//!
//! Eight clinical indicators matching the training dataset columns:
//! gender, age, hypertension, heart_disease, smoking_history, bmi,
//! HbA1c_level, blood_glucose_level

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::GlycoscreenError;

/// Accepted age range in years (inclusive).
pub const AGE_RANGE: std::ops::RangeInclusive<u8> = 18..=90;

/// Accepted HbA1c range in % (inclusive).
pub const HBA1C_RANGE: std::ops::RangeInclusive<f64> = 4.0..=15.0;

/// Accepted blood glucose range in mg/dL (inclusive).
pub const GLUCOSE_RANGE: std::ops::RangeInclusive<f64> = 70.0..=300.0;

/// Biological sex as recorded in the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Category name used by the training-time one-hot columns.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Smoking history categories.
///
/// `occasional` is accepted at the input boundary even though the trained model may not
/// have a column for it; the encoder then contributes zeros for the whole family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingHistory {
    Never,
    Former,
    Current,
    Occasional,
    #[serde(rename = "not current", alias = "not-current", alias = "not_current")]
    NotCurrent,
    Ever,
}

impl SmokingHistory {
    /// Category name used by the training-time one-hot columns.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Former => "former",
            Self::Current => "current",
            Self::Occasional => "occasional",
            Self::NotCurrent => "not current",
            Self::Ever => "ever",
        }
    }

    /// Parse a free-text category (case-insensitive, `-`/`_` treated as spaces).
    ///
    /// # Errors
    /// Returns the rejected input when it names no known category.
    pub fn parse(s: &str) -> Result<Self, String> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "never" => Ok(Self::Never),
            "former" => Ok(Self::Former),
            "current" => Ok(Self::Current),
            "occasional" => Ok(Self::Occasional),
            "not current" => Ok(Self::NotCurrent),
            "ever" => Ok(Self::Ever),
            _ => Err(format!("Unknown smoking history '{s}'")),
        }
    }
}

impl std::fmt::Display for SmokingHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Clinical attributes collected for one assessment.
///
/// Serialized field names match the training dataset, so a JSON object exported
/// from the intake form deserializes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientAttributes {
    pub gender: Gender,

    /// Age in years (18-90)
    pub age: u8,

    /// Doctor-diagnosed hypertension
    #[serde(with = "flag")]
    pub hypertension: bool,

    /// Doctor-diagnosed heart disease
    #[serde(with = "flag")]
    pub heart_disease: bool,

    pub smoking_history: SmokingHistory,

    /// Body mass index in kg/m² (>= 0)
    pub bmi: f64,

    /// Glycated haemoglobin in % (4.0-15.0)
    #[serde(rename = "HbA1c_level")]
    pub hba1c_level: f64,

    /// Blood glucose in mg/dL (70-300)
    pub blood_glucose_level: f64,
}

impl PatientAttributes {
    /// Validate that all attributes are within their accepted ranges.
    ///
    /// # Errors
    /// Returns every violation found, not only the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !AGE_RANGE.contains(&self.age) {
            errors.push(format!(
                "Age {} out of range [{}, {}]",
                self.age,
                AGE_RANGE.start(),
                AGE_RANGE.end()
            ));
        }
        if !self.bmi.is_finite() || self.bmi < 0.0 {
            errors.push(format!("BMI {} must be a non-negative number", self.bmi));
        }
        if !HBA1C_RANGE.contains(&self.hba1c_level) {
            errors.push(format!(
                "HbA1c {} out of range [{}, {}]",
                self.hba1c_level,
                HBA1C_RANGE.start(),
                HBA1C_RANGE.end()
            ));
        }
        if !GLUCOSE_RANGE.contains(&self.blood_glucose_level) {
            errors.push(format!(
                "Blood glucose {} out of range [{}, {}]",
                self.blood_glucose_level,
                GLUCOSE_RANGE.start(),
                GLUCOSE_RANGE.end()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Consume the attributes, returning them only if they pass validation.
    ///
    /// # Errors
    /// Returns `GlycoscreenError::Validation` listing every violation.
    pub fn validated(self) -> Result<Self, GlycoscreenError> {
        self.validate().map_err(GlycoscreenError::Validation)?;
        Ok(self)
    }
}

/// Who the patient is. Kept apart from the clinical attributes so that the
/// scoring pipeline never sees identifying data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub patient_id: String,
    pub name: Option<String>,
    pub mobile: Option<String>,
}

impl PatientIdentity {
    /// Identity with a freshly issued patient id.
    #[must_use]
    pub fn new_patient() -> Self {
        Self {
            patient_id: generate_patient_id(),
            name: None,
            mobile: None,
        }
    }

    #[must_use]
    pub fn with_id(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            name: None,
            mobile: None,
        }
    }
}

/// Issue a patient id of the form `PID-YYYYMMDD-NNNN`.
#[must_use]
pub fn generate_patient_id() -> String {
    let mut rng = ChaCha20Rng::from_entropy();
    let suffix: u16 = rng.gen_range(1000..=9999);
    format!("PID-{}-{suffix}", chrono::Local::now().format("%Y%m%d"))
}

/// Booleans travel as 0/1 in the intake export; accept either form.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Int(u8),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Bool(b) => Ok(b),
            Repr::Int(0) => Ok(false),
            Repr::Int(1) => Ok(true),
            Repr::Int(other) => Err(serde::de::Error::custom(format!(
                "expected 0 or 1, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_attributes() -> PatientAttributes {
    PatientAttributes {
        gender: Gender::Female,
        age: 45,
        hypertension: false,
        heart_disease: false,
        smoking_history: SmokingHistory::Never,
        bmi: 32.0,
        hba1c_level: 7.1,
        blood_glucose_level: 180.0,
    }
}
