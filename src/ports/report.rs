//! Report port: Trait for rendering an assessment into a printable document.

use crate::domain::{PatientAttributes, PatientIdentity, RiskResult, SeverityResult};

/// Everything a report shows. Borrowed from the assessment; the renderer owns nothing.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub identity: &'a PatientIdentity,
    pub attributes: &'a PatientAttributes,
    pub risk: &'a RiskResult,
    pub severity: &'a SeverityResult,
    pub explanation: &'a str,
    pub next_steps: &'a [&'static str],
    pub generated_at: chrono::DateTime<chrono::Local>,
}

/// Renders a report document.
pub trait ReportRenderer: Send + Sync {
    /// Error type for rendering.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Render the document bytes.
    ///
    /// # Errors
    /// Returns error if the document cannot be produced.
    fn render(&self, input: &ReportInput<'_>) -> Result<Vec<u8>, Self::Error>;

    /// Suggested file name for a patient's report.
    fn file_name(&self, patient_id: &str) -> String;
}
