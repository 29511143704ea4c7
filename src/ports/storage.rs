//! Storage port: Trait for the append-only patient record store.
//!
//! The pipeline only appends. History queries exist for the presentation layer.

use crate::domain::PatientRecord;

/// One window of the record listing, newest first.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<PatientRecord>,
    /// Records in the whole store, not just this window
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl RecordPage {
    /// True when no records follow this window.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.offset + self.records.len() >= self.total
    }

    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        (!self.is_last() && self.limit > 0).then(|| self.offset + self.limit)
    }

    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }

    /// One-based positions of the first and last record shown, `None` for an empty window.
    #[must_use]
    pub fn span(&self) -> Option<(usize, usize)> {
        (!self.records.is_empty()).then(|| (self.offset + 1, self.offset + self.records.len()))
    }
}

/// Trait for the longitudinal record store.
///
/// Implementations serialize concurrent appends themselves.
pub trait RecordStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append one assessment record.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn append_record(&self, record: &PatientRecord) -> Result<(), Self::Error>;

    /// All records of one patient, oldest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_history(&self, patient_id: &str) -> Result<Vec<PatientRecord>, Self::Error>;

    /// Most recent records across all patients (up to `limit`), newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_recent(&self, limit: usize) -> Result<Vec<PatientRecord>, Self::Error>;

    /// Records with pagination, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_paginated(&self, offset: usize, limit: usize) -> Result<RecordPage, Self::Error>;

    /// Distinct patient ids, in order of first assessment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn patient_ids(&self) -> Result<Vec<String>, Self::Error>;

}
