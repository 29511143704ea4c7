//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `artifact`: JSON model export and manifest digest check
//! - `gemini`: reqwest client for the Gemini text service
//! - `sqlite`: SQLite for the patient record store
//! - `report`: plain-text assessment report
//! - `sanitize`: PII filtering for logs

pub mod artifact;
pub mod gemini;
pub mod report;
pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
