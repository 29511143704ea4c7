//! Persisted assessment record.
//!
//! One row per completed assessment. Records are only ever appended.

use serde::{Deserialize, Serialize};

use super::{PatientAttributes, PatientIdentity, RiskResult};

/// Complete assessment record including metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Unique record identifier
    pub id: String,

    pub identity: PatientIdentity,

    pub attributes: PatientAttributes,

    /// Risk as stored (probability rounded to three decimals)
    pub risk: RiskResult,

    /// Timestamp of the assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PatientRecord {
    /// Create a new record for an assessment happening now.
    #[must_use]
    pub fn new(identity: PatientIdentity, attributes: PatientAttributes, risk: RiskResult) -> Self {
        Self {
            id: new_record_id(),
            identity,
            attributes,
            risk: RiskResult {
                probability: round3(risk.probability),
                category: risk.category,
            },
            created_at: chrono::Utc::now(),
        }
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Random RFC 4122 version 4 identifier, drawn from an entropy-seeded `ChaCha20Rng`.
fn new_record_id() -> String {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    let mut bytes: [u8; 16] = ChaCha20Rng::from_entropy().gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..]
    )
}
