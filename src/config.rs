//! Process configuration from the environment.
//!
//! Supported:
//! - `GLYCOSCREEN_MODEL_DIR` (default `models`)
//! - `GLYCOSCREEN_DB_PATH` (default `data/clinical.db`)
//! - `GEMINI_API_KEY` (optional; absent disables remote explanations)
//! - `GLYCOSCREEN_GEMINI_MODEL` (default `gemini-1.5-flash`)
//! - `GLYCOSCREEN_GEMINI_BASE_URL`
//! - `GLYCOSCREEN_LLM_TIMEOUT_SECS` (default 15, > 0)
//! - `GLYCOSCREEN_REQUIRE_MODEL_MANIFEST` (default false; refuse a model without `manifest.json`)
//!
//! `.env` is loaded once by the binary before logging starts, so this module only
//! reads what is already in the process environment.

use std::path::PathBuf;

use crate::adapters::gemini::{GeminiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::GlycoscreenError;

pub const MODEL_DIR_ENV: &str = "GLYCOSCREEN_MODEL_DIR";
pub const DB_PATH_ENV: &str = "GLYCOSCREEN_DB_PATH";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "GLYCOSCREEN_GEMINI_MODEL";
pub const GEMINI_BASE_URL_ENV: &str = "GLYCOSCREEN_GEMINI_BASE_URL";
pub const TIMEOUT_ENV: &str = "GLYCOSCREEN_LLM_TIMEOUT_SECS";
pub const REQUIRE_MANIFEST_ENV: &str = "GLYCOSCREEN_REQUIRE_MODEL_MANIFEST";

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_DB_PATH: &str = "data/clinical.db";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Resolved process configuration.
#[derive(Clone)]
pub struct Config {
    pub model_dir: PathBuf,
    pub db_path: PathBuf,
    /// `None` when no API key is configured.
    pub gemini: Option<GeminiSettings>,
    pub timeout_secs: u64,
    /// Refuse to load a model directory without `manifest.json`
    pub require_manifest: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("model_dir", &self.model_dir)
            .field("db_path", &self.db_path)
            .field("gemini_enabled", &self.gemini.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .field("require_manifest", &self.require_manifest)
            .finish()
    }
}

impl Config {
    /// Read the process environment.
    ///
    /// # Errors
    /// Returns `GlycoscreenError::Configuration` on an unparsable or out-of-range value.
    pub fn from_env() -> Result<Self, GlycoscreenError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    ///
    /// # Errors
    /// Returns `GlycoscreenError::Configuration` on an unparsable or out-of-range value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GlycoscreenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout_secs = match get(TIMEOUT_ENV) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(GlycoscreenError::Configuration(format!(
                        "{TIMEOUT_ENV} must be a positive integer, got '{raw}'"
                    )))
                }
            },
        };

        let require_manifest = match get(REQUIRE_MANIFEST_ENV) {
            None => false,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(GlycoscreenError::Configuration(format!(
                        "{REQUIRE_MANIFEST_ENV} must be true or false, got '{raw}'"
                    )))
                }
            },
        };

        let base_url = get(GEMINI_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GlycoscreenError::Configuration(format!(
                "{GEMINI_BASE_URL_ENV} must be an http(s) URL, got '{base_url}'"
            )));
        }

        let gemini = get(API_KEY_ENV).map(|api_key| GeminiSettings {
            base_url,
            model: get(GEMINI_MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            timeout_secs,
        });

        Ok(Self {
            model_dir: get(MODEL_DIR_ENV)
                .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from),
            db_path: get(DB_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            gemini,
            timeout_secs,
            require_manifest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, GlycoscreenError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).expect("Should load");
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.db_path, PathBuf::from("data/clinical.db"));
        assert_eq!(config.timeout_secs, 15);
        assert!(config.gemini.is_none());
    }

    #[test]
    fn test_api_key_enables_gemini() {
        let config = config_from(&[
            (API_KEY_ENV, "secret-key"),
            (TIMEOUT_ENV, "5"),
            (GEMINI_MODEL_ENV, "gemini-2.0-flash"),
        ])
        .expect("Should load");
        let gemini = config.gemini.as_ref().expect("enabled");
        assert_eq!(gemini.model, "gemini-2.0-flash");
        assert_eq!(gemini.base_url, DEFAULT_BASE_URL);
        assert_eq!(gemini.timeout_secs, 5);
        assert!(!format!("{config:?}").contains("secret-key"));
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = config_from(&[(API_KEY_ENV, "  ")]).expect("Should load");
        assert!(config.gemini.is_none());
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        for bad in ["0", "-3", "soon"] {
            let err = config_from(&[(TIMEOUT_ENV, bad)]).expect_err("Should reject");
            assert!(matches!(err, GlycoscreenError::Configuration(_)));
            assert!(err.is_fatal());
        }

        let err = config_from(&[(GEMINI_BASE_URL_ENV, "ftp://example")]).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
    }

    #[test]
    fn test_require_manifest_flag() {
        assert!(!config_from(&[]).expect("Should load").require_manifest);
        for raw in ["true", "TRUE", "1", "yes"] {
            let config = config_from(&[(REQUIRE_MANIFEST_ENV, raw)]).expect("Should load");
            assert!(config.require_manifest, "{raw}");
        }
        let config = config_from(&[(REQUIRE_MANIFEST_ENV, "false")]).expect("Should load");
        assert!(!config.require_manifest);

        let err = config_from(&[(REQUIRE_MANIFEST_ENV, "sometimes")]).expect_err("Should reject");
        assert!(matches!(err, GlycoscreenError::Configuration(_)));
    }
}
