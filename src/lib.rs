//! # Glycoscreen
//!
//! Diabetes risk screening pipeline.
//!
//! This crate provides:
//! - Feature encoding of validated patient attributes into the model's column layout
//! - Risk scoring with a pre-trained logistic model and fitted scaler
//! - Severity/urgency triage on a finer percentage scale
//! - Patient and clinician explanations with a deterministic fallback
//! - Deterministic factor contributions and counterfactual guidance
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and pure rules (attributes, encoder, risk and severity bands)
//! - `ports`: Trait definitions for external collaborators
//! - `adapters`: Concrete implementations (JSON model artifact, Gemini, SQLite, text report)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Process configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{PatientAttributes, RiskCategory, RiskResult, SeverityResult};

/// Result type for Glycoscreen operations
pub type Result<T> = std::result::Result<T, GlycoscreenError>;

/// Main error type for Glycoscreen
#[derive(Debug, thiserror::Error)]
pub enum GlycoscreenError {
    /// Startup-time misconfiguration: the pipeline cannot run at all.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model artifact could not be read.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// A single assessment was rejected by the scorer.
    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Invalid patient data: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Report rendering failed: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GlycoscreenError {
    /// Whether this error must abort process startup rather than a single request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::ModelUnavailable(_))
    }
}
