//! Feature encoding: patient attributes to the trained model's column layout.
//!
//! Categorical attributes are expanded one-hot with `<attribute>_<category>` column
//! names, the same naming the training-time dummy encoding produced. The result is then
//! reindexed onto the artifact's recorded columns; any column the expansion did not
//! produce is zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::PatientAttributes;
use crate::GlycoscreenError;

/// Numeric column names, in dataset order.
pub const NUMERIC_COLUMNS: [&str; 6] = [
    "age",
    "hypertension",
    "heart_disease",
    "bmi",
    "HbA1c_level",
    "blood_glucose_level",
];

const GENDER_PREFIX: &str = "gender";
const SMOKING_PREFIX: &str = "smoking_history";

/// Encoded features aligned to the model's expected columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatureVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl EncodedFeatureVector {
    /// Build a vector directly from aligned columns and values.
    ///
    /// # Errors
    /// Returns `GlycoscreenError::Scoring` if the lengths differ.
    pub fn from_parts(columns: Vec<String>, values: Vec<f64>) -> Result<Self, GlycoscreenError> {
        if columns.len() != values.len() {
            return Err(GlycoscreenError::Scoring(format!(
                "Feature vector has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, values })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column, if the layout has it.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }
}

/// One-hot column name for a categorical value.
#[must_use]
pub fn dummy_column(prefix: &str, category: &str) -> String {
    format!("{prefix}_{category}")
}

/// Encode attributes onto `expected_columns`.
///
/// # Errors
/// Returns `GlycoscreenError::Configuration` when `expected_columns` is empty, which
/// means no trained artifact was loaded.
pub fn encode(
    attrs: &PatientAttributes,
    expected_columns: &[String],
) -> Result<EncodedFeatureVector, GlycoscreenError> {
    if expected_columns.is_empty() {
        return Err(GlycoscreenError::Configuration(
            "Expected feature columns are not set (model artifact not loaded)".into(),
        ));
    }

    let expanded = expand(attrs);
    let values = expected_columns
        .iter()
        .map(|column| expanded.get(column.as_str()).copied().unwrap_or(0.0))
        .collect();

    Ok(EncodedFeatureVector {
        columns: expected_columns.to_vec(),
        values,
    })
}

/// Sparse one-hot expansion: numeric columns plus one indicator per categorical attribute.
fn expand(attrs: &PatientAttributes) -> HashMap<String, f64> {
    let numeric = [
        f64::from(attrs.age),
        f64::from(u8::from(attrs.hypertension)),
        f64::from(u8::from(attrs.heart_disease)),
        attrs.bmi,
        attrs.hba1c_level,
        attrs.blood_glucose_level,
    ];

    let mut out: HashMap<String, f64> = NUMERIC_COLUMNS
        .iter()
        .map(|name| (*name).to_string())
        .zip(numeric)
        .collect();
    out.insert(dummy_column(GENDER_PREFIX, attrs.gender.label()), 1.0);
    out.insert(
        dummy_column(SMOKING_PREFIX, attrs.smoking_history.label()),
        1.0,
    );
    out
}
