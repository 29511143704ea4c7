//! Model artifact adapter: logistic regression + standard scaler from JSON.
//!
//! The training job exports `model.json` next to an optional `manifest.json`.
//!
//! # Integrity
//!
//! When `manifest.json` is present it must list `model.json` with its SHA-256 digest,
//! and the loader refuses a file whose digest differs. Callers pass
//! `require_manifest` to make the manifest mandatory.
//! Any failure here is a startup error: the pipeline does not run without a model.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::application::ModelArtifact;
use crate::ports::{Classifier, FeatureScaler};
use crate::GlycoscreenError;

pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors raised while loading the artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid {file} format: {source}")]
    Parse {
        file: &'static str,
        source: serde_json::Error,
    },

    #[error("Invalid model parameters: {0}")]
    Invalid(String),

    #[error("Manifest required but {0:?} is missing")]
    ManifestMissing(PathBuf),

    #[error("Unsupported manifest version: {0}")]
    UnsupportedManifest(u32),

    #[error("Digest mismatch for {file}: manifest {expected}, actual {actual}")]
    DigestMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

impl From<ArtifactError> for GlycoscreenError {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::NotFound(_) | ArtifactError::Read { .. } => {
                Self::ModelUnavailable(e.to_string())
            }
            _ => Self::Configuration(e.to_string()),
        }
    }
}

/// Model parameters exported by the training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
}

/// Manifest binding model files to their digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

/// Binary logistic regression: `sigmoid(w·x + b)`.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    #[must_use]
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, scaled: &[f64]) -> f64 {
        let z = self
            .coefficients
            .iter()
            .zip(scaled)
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        sigmoid(z)
    }

    fn coefficients(&self) -> Option<&[f64]> {
        Some(&self.coefficients)
    }
}

/// Standardization `(x - mean) / scale` with per-feature parameters.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    #[must_use]
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }
}

impl FeatureScaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

impl ExportedModel {
    /// Check lengths and numeric sanity of the exported parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("feature_names is empty".into()));
        }
        if self.coefficients.len() != n || self.scaler_mean.len() != n || self.scaler_scale.len() != n
        {
            return Err(ArtifactError::Invalid(format!(
                "parameter lengths do not match {n} feature_names (coefficients={}, scaler_mean={}, scaler_scale={})",
                self.coefficients.len(),
                self.scaler_mean.len(),
                self.scaler_scale.len()
            )));
        }
        let all_finite = self
            .coefficients
            .iter()
            .chain(&self.scaler_mean)
            .chain(&self.scaler_scale)
            .chain(std::iter::once(&self.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ArtifactError::Invalid("non-finite parameter".into()));
        }
        if let Some(i) = self.scaler_scale.iter().position(|s| *s == 0.0) {
            return Err(ArtifactError::Invalid(format!(
                "scaler_scale is zero for '{}'",
                self.feature_names[i]
            )));
        }
        Ok(())
    }

    /// Turn the exported parameters into a scoring artifact.
    ///
    /// # Errors
    /// Returns an error if the parameters are invalid.
    pub fn into_artifact(self) -> Result<ModelArtifact, GlycoscreenError> {
        self.validate()?;
        ModelArtifact::new(
            self.feature_names,
            Box::new(LogisticModel::new(self.coefficients, self.intercept)),
            Box::new(StandardScaler::new(self.scaler_mean, self.scaler_scale)),
        )
    }
}

/// SHA-256 of a byte slice as lowercase hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Verify `model_bytes` against the manifest in `dir`, if there is one.
fn verify_manifest(dir: &Path, model_bytes: &[u8], required: bool) -> Result<(), ArtifactError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        if required {
            return Err(ArtifactError::ManifestMissing(manifest_path));
        }
        tracing::warn!(
            "No {MANIFEST_FILE} in {:?}; loading model without integrity check",
            dir
        );
        return Ok(());
    }

    let content = read_file(&manifest_path)?;
    let manifest: ModelManifest =
        serde_json::from_slice(&content).map_err(|source| ArtifactError::Parse {
            file: MANIFEST_FILE,
            source,
        })?;
    if manifest.version != 1 {
        return Err(ArtifactError::UnsupportedManifest(manifest.version));
    }

    let expected = manifest.files.get(MODEL_FILE).ok_or_else(|| {
        ArtifactError::Invalid(format!("{MANIFEST_FILE} does not list {MODEL_FILE}"))
    })?;
    let actual = sha256_hex(model_bytes);
    if !expected.eq_ignore_ascii_case(&actual) {
        return Err(ArtifactError::DigestMismatch {
            file: MODEL_FILE.to_string(),
            expected: expected.clone(),
            actual,
        });
    }

    tracing::info!("Model digest verified against {MANIFEST_FILE}");
    Ok(())
}

/// Load the exported parameters from a directory (or a direct path to `model.json`).
///
/// # Errors
/// Returns an error if the file is missing, unreadable, malformed or fails the manifest check.
pub fn load_exported_model(
    path: &Path,
    require_manifest: bool,
) -> Result<ExportedModel, ArtifactError> {
    let (dir, model_path) = if path.is_file() {
        (
            path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            path.to_path_buf(),
        )
    } else {
        (path.to_path_buf(), path.join(MODEL_FILE))
    };

    let bytes = read_file(&model_path)?;
    verify_manifest(&dir, &bytes, require_manifest)?;

    let model: ExportedModel =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
            file: MODEL_FILE,
            source,
        })?;
    model.validate()?;

    tracing::info!(
        "Loaded model from {:?} (n_features={})",
        model_path,
        model.feature_names.len()
    );
    Ok(model)
}

/// Load and assemble the scoring artifact.
///
/// # Errors
/// `GlycoscreenError::ModelUnavailable` when the file cannot be read,
/// `GlycoscreenError::Configuration` when it is invalid.
pub fn load_artifact(path: &Path, require_manifest: bool) -> Result<ModelArtifact, GlycoscreenError> {
    load_exported_model(path, require_manifest)?.into_artifact()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NUMERIC_COLUMNS;
    use tempfile::tempdir;

    /// Model over `columns` with equal weights.
    fn exported_over(columns: &[&str]) -> ExportedModel {
        let n = columns.len();
        ExportedModel {
            feature_names: columns.iter().map(|c| (*c).to_string()).collect(),
            coefficients: vec![0.5; n],
            intercept: -1.0,
            scaler_mean: vec![1.0; n],
            scaler_scale: vec![2.0; n],
        }
    }

    fn exported() -> ExportedModel {
        exported_over(&NUMERIC_COLUMNS)
    }

    fn write_model(dir: &Path, model: &ExportedModel) -> Vec<u8> {
        let bytes = serde_json::to_vec(model).expect("serialize model");
        fs::write(dir.join(MODEL_FILE), &bytes).expect("write model");
        bytes
    }

    fn write_manifest(dir: &Path, digest: &str) {
        let mut files = BTreeMap::new();
        files.insert(MODEL_FILE.to_string(), digest.to_string());
        let manifest = ModelManifest {
            version: 1,
            created_at: Some(0),
            files,
        };
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).expect("serialize manifest"),
        )
        .expect("write manifest");
    }

    #[test]
    fn test_logistic_and_scaler_math() {
        let scaler = StandardScaler::new(vec![1.0, 10.0], vec![2.0, 5.0]);
        assert_eq!(scaler.transform(&[3.0, 0.0]), vec![1.0, -2.0]);

        let model = LogisticModel::new(vec![1.0, 0.5], 0.0);
        assert!((model.predict_proba(&[0.0, 0.0]) - 0.5).abs() < 1e-12);
        let p = model.predict_proba(&[1.0, -2.0]);
        assert!((p - 0.5).abs() < 1e-12);
        assert!(model.predict_proba(&[10.0, 10.0]) > 0.99);
    }

    #[test]
    fn test_load_verified_model() {
        let temp = tempdir().expect("tempdir");
        let bytes = write_model(temp.path(), &exported());
        write_manifest(temp.path(), &sha256_hex(&bytes));

        let artifact = load_artifact(temp.path(), true).expect("Should load");
        assert_eq!(artifact.feature_columns(), NUMERIC_COLUMNS);
        assert_eq!(artifact.top_factors(2).len(), 2);
    }

    #[test]
    fn test_load_accepts_direct_file_path() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &exported());
        let model =
            load_exported_model(&temp.path().join(MODEL_FILE), false).expect("Should load");
        assert_eq!(model.feature_names.len(), NUMERIC_COLUMNS.len());
    }

    #[test]
    fn test_digest_mismatch_is_configuration_error() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &exported());
        write_manifest(temp.path(), &sha256_hex(b"something else"));

        let err = load_artifact(temp.path(), false).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_model_is_model_unavailable() {
        let temp = tempdir().expect("tempdir");
        let err = load_artifact(temp.path(), false).expect_err("Should fail");
        assert!(matches!(err, GlycoscreenError::ModelUnavailable(_)));
    }

    #[test]
    fn test_corrupt_model_is_rejected() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{ not json").expect("write");
        assert!(matches!(
            load_artifact(temp.path(), false),
            Err(GlycoscreenError::Configuration(_))
        ));

        let mut bad = exported();
        bad.scaler_scale.pop();
        assert!(matches!(bad.validate(), Err(ArtifactError::Invalid(_))));

        let mut zero = exported();
        zero.scaler_scale[1] = 0.0;
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_shipped_model_matches_manifest() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let artifact = load_artifact(&dir, true).expect("Shipped model should load");
        assert_eq!(artifact.feature_columns().len(), 15);
    }

    #[test]
    fn test_required_manifest_must_exist() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &exported());

        let err = load_artifact(temp.path(), true).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
        assert!(load_artifact(temp.path(), false).is_ok());
    }

    #[test]
    fn test_missing_measurement_column_is_rejected_at_load() {
        let temp = tempdir().expect("tempdir");
        let mut model = exported_over(&[
            "age",
            "hypertension",
            "heart_disease",
            "BMI",
            "HbA1c_level",
            "blood_glucose_level",
        ]);
        model.coefficients[3] = 5.0;
        write_model(temp.path(), &model);

        let err = load_artifact(temp.path(), false).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
        assert!(err.to_string().contains("bmi"));
    }
}
