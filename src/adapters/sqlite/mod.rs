//! SQLite adapter: Implementation of RecordStore.
//!
//! Provides local persistence for the longitudinal `patient_records` table.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`, which serializes concurrent appends.
//! A poisoned mutex is reported as `StorageError::LockPoisoned` rather than
//! silently reused.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, Row};

use crate::domain::{
    Gender, PatientAttributes, PatientIdentity, PatientRecord, RiskCategory, RiskResult,
    SmokingHistory,
};
use crate::ports::{RecordPage, RecordStore};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Could not create database directory: {0}")]
    Directory(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

const SELECT_COLUMNS: &str = r"
    SELECT id, patient_id, name, mobile, gender, age, hypertension, heart_disease,
           smoking_history, bmi, hba1c, glucose, risk_probability, risk_category,
           created_at
    FROM patient_records";

/// SQLite storage adapter.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path`, creating parent directories as needed.
    ///
    /// # Errors
    /// Returns error if the directory or database cannot be created or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::debug!("Opened record store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS patient_records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                patient_id TEXT NOT NULL,
                name TEXT,
                mobile TEXT,
                gender TEXT NOT NULL,
                age INTEGER NOT NULL,
                hypertension INTEGER NOT NULL,
                heart_disease INTEGER NOT NULL,
                smoking_history TEXT NOT NULL,
                bmi REAL NOT NULL,
                hba1c REAL NOT NULL,
                glucose REAL NOT NULL,
                risk_probability REAL NOT NULL,
                risk_category TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_patient
                ON patient_records(patient_id, seq);
            ",
        )?;

        Ok(())
    }

    /// Map one row (in `SELECT_COLUMNS` order) back into a record.
    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            name: row.get(2)?,
            mobile: row.get(3)?,
            gender: row.get(4)?,
            age: row.get(5)?,
            hypertension: row.get(6)?,
            heart_disease: row.get(7)?,
            smoking_history: row.get(8)?,
            bmi: row.get(9)?,
            hba1c: row.get(10)?,
            glucose: row.get(11)?,
            risk_probability: row.get(12)?,
            risk_category: row.get(13)?,
            created_at: row.get(14)?,
        })
    }

    fn query_records(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<PatientRecord>, StorageError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRow::into_record).collect()
    }
}

/// Column values as stored, before domain validation.
struct RawRow {
    id: String,
    patient_id: String,
    name: Option<String>,
    mobile: Option<String>,
    gender: String,
    age: i64,
    hypertension: i64,
    heart_disease: i64,
    smoking_history: String,
    bmi: f64,
    hba1c: f64,
    glucose: f64,
    risk_probability: f64,
    risk_category: String,
    created_at: String,
}

impl RawRow {
    fn into_record(self) -> Result<PatientRecord, StorageError> {
        let corrupt = |what: String| StorageError::Corrupt(format!("{}: {what}", self.id));

        let gender = match self.gender.as_str() {
            "Male" => Gender::Male,
            "Female" => Gender::Female,
            other => return Err(corrupt(format!("unknown gender '{other}'"))),
        };
        let smoking_history = SmokingHistory::parse(&self.smoking_history).map_err(&corrupt)?;
        let age = u8::try_from(self.age).map_err(|_| corrupt(format!("age {}", self.age)))?;
        let category = RiskCategory::parse(&self.risk_category)
            .ok_or_else(|| corrupt(format!("unknown risk category '{}'", self.risk_category)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| corrupt(format!("timestamp '{}': {e}", self.created_at)))?;

        Ok(PatientRecord {
            identity: PatientIdentity {
                patient_id: self.patient_id,
                name: self.name,
                mobile: self.mobile,
            },
            attributes: PatientAttributes {
                gender,
                age,
                hypertension: self.hypertension != 0,
                heart_disease: self.heart_disease != 0,
                smoking_history,
                bmi: self.bmi,
                hba1c_level: self.hba1c,
                blood_glucose_level: self.glucose,
            },
            risk: RiskResult {
                probability: self.risk_probability,
                category,
            },
            created_at,
            id: self.id,
        })
    }
}

impl RecordStore for SqliteRecordStore {
    type Error = StorageError;

    fn append_record(&self, record: &PatientRecord) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        let attrs = &record.attributes;

        conn.execute(
            r"
            INSERT INTO patient_records (
                id, patient_id, name, mobile, gender, age, hypertension, heart_disease,
                smoking_history, bmi, hba1c, glucose, risk_probability, risk_category,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ",
            params![
                record.id,
                record.identity.patient_id,
                record.identity.name,
                record.identity.mobile,
                attrs.gender.label(),
                i64::from(attrs.age),
                i64::from(attrs.hypertension),
                i64::from(attrs.heart_disease),
                attrs.smoking_history.label(),
                attrs.bmi,
                attrs.hba1c_level,
                attrs.blood_glucose_level,
                record.risk.probability,
                record.risk.category.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Saved record {} to storage", record.id);
        Ok(())
    }

    fn load_history(&self, patient_id: &str) -> Result<Vec<PatientRecord>, Self::Error> {
        let conn = self.lock()?;
        Self::query_records(
            &conn,
            &format!("{SELECT_COLUMNS} WHERE patient_id = ?1 ORDER BY seq ASC"),
            params![patient_id],
        )
    }

    fn load_recent(&self, limit: usize) -> Result<Vec<PatientRecord>, Self::Error> {
        let conn = self.lock()?;
        Self::query_records(
            &conn,
            &format!("{SELECT_COLUMNS} ORDER BY seq DESC LIMIT ?1"),
            params![i64::try_from(limit).unwrap_or(i64::MAX)],
        )
    }

    fn load_paginated(&self, offset: usize, limit: usize) -> Result<RecordPage, Self::Error> {
        let conn = self.lock()?;

        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM patient_records", [], |row| row.get(0))?;

        let records = Self::query_records(
            &conn,
            &format!("{SELECT_COLUMNS} ORDER BY seq DESC LIMIT ?1 OFFSET ?2"),
            params![
                i64::try_from(limit).unwrap_or(i64::MAX),
                i64::try_from(offset).unwrap_or(i64::MAX)
            ],
        )?;

        Ok(RecordPage {
            records,
            total: usize::try_from(total).unwrap_or(0),
            offset,
            limit,
        })
    }

    fn patient_ids(&self) -> Result<Vec<String>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT patient_id FROM patient_records
            GROUP BY patient_id
            ORDER BY MIN(seq) ASC
            ",
        )?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_attributes;

    fn record_for(patient_id: &str, probability: f64) -> PatientRecord {
        let identity = PatientIdentity {
            patient_id: patient_id.to_string(),
            name: Some("Asha Rao".into()),
            mobile: None,
        };
        let risk = RiskResult::from_probability(probability).expect("valid probability");
        PatientRecord::new(identity, sample_attributes(), risk)
    }

    #[test]
    fn test_record_roundtrip() {
        let store = SqliteRecordStore::in_memory().expect("Should create db");
        assert_eq!(store.load_paginated(0, 10).expect("Should page").total, 0);

        let mut record = record_for("PID-20251016-1234", 0.6534);
        record.attributes.smoking_history = SmokingHistory::NotCurrent;
        record.attributes.hypertension = true;
        store.append_record(&record).expect("Should save");

        let loaded = store.load_history("PID-20251016-1234").expect("Should load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, record.id);
        assert_eq!(loaded[0].identity, record.identity);
        assert_eq!(loaded[0].attributes, record.attributes);
        assert_eq!(loaded[0].risk.category, RiskCategory::High);
        assert!((loaded[0].risk.probability - 0.653).abs() < 1e-12);
    }

    #[test]
    fn test_history_is_per_patient_and_oldest_first() {
        let store = SqliteRecordStore::in_memory().expect("Should create db");
        store.append_record(&record_for("PID-A", 0.1)).expect("save");
        store.append_record(&record_for("PID-B", 0.5)).expect("save");
        store.append_record(&record_for("PID-A", 0.7)).expect("save");

        let history = store.load_history("PID-A").expect("Should load");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].risk.category, RiskCategory::Low);
        assert_eq!(history[1].risk.category, RiskCategory::High);

        assert!(store.load_history("PID-missing").expect("Should load").is_empty());
        assert_eq!(
            store.patient_ids().expect("Should list"),
            vec!["PID-A".to_string(), "PID-B".to_string()]
        );
    }

    #[test]
    fn test_recent_and_pagination_newest_first() {
        let store = SqliteRecordStore::in_memory().expect("Should create db");
        for i in 0..5 {
            store
                .append_record(&record_for(&format!("PID-{i}"), 0.1))
                .expect("save");
        }

        let recent = store.load_recent(2).expect("Should load");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].identity.patient_id, "PID-4");

        let page = store.load_paginated(2, 2).expect("Should page");
        assert_eq!(page.total, 5);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].identity.patient_id, "PID-2");
        assert!(!page.is_last());
        assert_eq!(page.next_offset(), Some(4));
        assert_eq!(page.prev_offset(), Some(0));

        let last = store.load_paginated(4, 2).expect("Should page");
        assert!(last.is_last());
        assert_eq!(last.next_offset(), None);
    }

    #[test]
    fn test_file_store_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("clinical.db");

        {
            let store = SqliteRecordStore::new(&path).expect("Should create db");
            store.append_record(&record_for("PID-X", 0.3)).expect("save");
        }

        let reopened = SqliteRecordStore::new(&path).expect("Should reopen");
        assert_eq!(reopened.load_paginated(0, 10).expect("Should page").total, 1);
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let store = SqliteRecordStore::in_memory().expect("Should create db");
        let record = record_for("PID-C", 0.2);
        store.append_record(&record).expect("save");
        store
            .lock()
            .expect("lock")
            .execute("UPDATE patient_records SET risk_category = 'extreme'", [])
            .expect("update");

        assert!(matches!(
            store.load_history("PID-C"),
            Err(StorageError::Corrupt(_))
        ));
    }
}
