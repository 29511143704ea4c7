//! Model sealing utility for Glycoscreen artifacts.
//!
//! Writes `manifest.json` binding `model.json` to its SHA-256 digest, so the loader
//! refuses a model file that changed after export.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin seal_model -- <model_dir>
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use glycoscreen::adapters::artifact::{
    sha256_hex, ExportedModel, ModelManifest, MANIFEST_FILE, MODEL_FILE,
};

fn usage() -> String {
    "Usage: seal_model <model_dir>".to_string()
}

fn parse_args() -> Result<PathBuf, String> {
    let mut model_dir: Option<PathBuf> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage()),
            _ => {
                if model_dir.is_none() {
                    model_dir = Some(PathBuf::from(arg));
                } else {
                    return Err(usage());
                }
            }
        }
    }

    model_dir.ok_or_else(usage)
}

fn main() -> Result<(), String> {
    let model_dir = parse_args()?;

    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .ok_or_else(|| "Model path has no parent directory".to_string())?
            .to_path_buf()
    } else {
        model_dir
    };

    let model_path = model_dir.join(MODEL_FILE);
    let bytes =
        fs::read(&model_path).map_err(|e| format!("Failed to read {model_path:?}: {e}"))?;

    // Refuse to seal something the loader would reject anyway.
    let model: ExportedModel = serde_json::from_slice(&bytes)
        .map_err(|e| format!("Invalid {MODEL_FILE}: {e}"))?;
    model.validate().map_err(|e| e.to_string())?;

    let digest = sha256_hex(&bytes);
    let mut files = BTreeMap::new();
    files.insert(MODEL_FILE.to_string(), digest.clone());

    let manifest = ModelManifest {
        version: 1,
        created_at: Some(chrono::Utc::now().timestamp()),
        files,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize {MANIFEST_FILE}: {e}"))?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .map_err(|e| format!("Failed to write {manifest_path:?}: {e}"))?;

    println!("Sealed {} features: {manifest_path:?}", model.feature_names.len());
    println!("{MODEL_FILE} sha256={digest}");

    Ok(())
}
