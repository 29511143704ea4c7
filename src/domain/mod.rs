//! Domain layer: Core types and pure screening rules.
//!
//! Nothing in this module performs I/O. Every function is deterministic given its
//! inputs, apart from identifier and timestamp generation for new records.

mod contribution;
mod encoding;
mod guidance;
mod patient;
mod record;
mod risk;
mod severity;

pub use contribution::{clinical_insights, contributions, RiskContributions, RiskFactor};
pub use encoding::{dummy_column, encode, EncodedFeatureVector, NUMERIC_COLUMNS};
pub use guidance::{counterfactuals, next_steps, ADVICE_MAINTAIN};
pub use patient::{
    generate_patient_id, Gender, PatientAttributes, PatientIdentity, SmokingHistory,
};
pub use record::PatientRecord;
pub use risk::{CategoryBand, RiskCategory, RiskResult, CATEGORY_BANDS};
pub use severity::{classify, classify_percent, SeverityBand, SeverityResult, SEVERITY_BANDS};

#[cfg(test)]
pub(crate) use patient::sample_attributes;
