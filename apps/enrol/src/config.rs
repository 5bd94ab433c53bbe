//! # Configuration
//!
//! Settings are resolved in three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. `enrol.toml` (the `--config` path, or `./enrol.toml` when present)
//! 3. environment: `ENROL_API_URL`, `ENROL_DATA_DIR`, `ENROL_SUBMIT_TIMEOUT_SECS`
//!
//! ```toml
//! api_url = "https://admissions.example.org"
//! submit_timeout_secs = 10
//! data_dir = "/var/lib/enrol"
//! ```

use crate::AppError;
use enrol_core::primitives::{DEFAULT_SUBMIT_TIMEOUT_SECS, SUBMIT_PATH};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "enrol.toml";

pub const ENV_API_URL: &str = "ENROL_API_URL";
pub const ENV_DATA_DIR: &str = "ENROL_DATA_DIR";
pub const ENV_SUBMIT_TIMEOUT: &str = "ENROL_SUBMIT_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the admissions backend.
    pub api_url: String,
    pub submit_path: String,
    pub submit_timeout_secs: u64,
    /// Holds the form records and the document database.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            submit_path: SUBMIT_PATH.to_string(),
            submit_timeout_secs: DEFAULT_SUBMIT_TIMEOUT_SECS,
            data_dir: PathBuf::from(".enrol"),
        }
    }
}

impl Config {
    /// Load from `path`, or from `./enrol.toml` if it exists, or defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "loaded configuration file");
                Self::from_toml_str(&text)
            }
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::Config(format!(
                "cannot read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Apply `ENROL_*` overrides through `lookup` (normally `std::env::var`).
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(ENV_SUBMIT_TIMEOUT) {
            self.submit_timeout_secs = secs.trim().parse().map_err(|_| {
                AppError::Config(format!("{ENV_SUBMIT_TIMEOUT} must be a number, got '{secs}'"))
            })?;
        }
        self.validated()
    }

    fn validated(self) -> Result<Self, AppError> {
        if self.submit_timeout_secs == 0 {
            return Err(AppError::Config(
                "submit_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "api_url must start with http:// or https://, got '{}'",
                self.api_url
            )));
        }
        Ok(self)
    }

    /// Full URL of the submission endpoint.
    #[must_use]
    pub fn submit_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.submit_path.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    /// Directory of the small key-value records.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    /// Path of the redb document database.
    #[must_use]
    pub fn documents_db(&self) -> PathBuf {
        self.data_dir.join("documents.redb")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_use_ten_second_timeout() {
        let config = Config::default().with_env(no_env).expect("valid");
        assert_eq!(config.submit_timeout(), Duration::from_secs(10));
        assert_eq!(config.submit_url(), "http://localhost:3000/api/admissions");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml_str(r#"api_url = "https://school.example/""#).expect("parse");
        assert_eq!(config.submit_url(), "https://school.example/api/admissions");
        assert_eq!(config.submit_timeout_secs, DEFAULT_SUBMIT_TIMEOUT_SECS);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(Config::from_toml_str("api_key = \"x\"").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let config = Config::from_toml_str("submit_timeout_secs = 30")
            .expect("parse")
            .with_env(|key| match key {
                ENV_SUBMIT_TIMEOUT => Some("5".to_string()),
                ENV_DATA_DIR => Some("/tmp/enrol".to_string()),
                _ => None,
            })
            .expect("valid");

        assert_eq!(config.submit_timeout_secs, 5);
        assert_eq!(config.documents_db(), PathBuf::from("/tmp/enrol/documents.redb"));
    }

    #[test]
    fn bad_env_values_rejected() {
        let bad_timeout = Config::default().with_env(|key| {
            (key == ENV_SUBMIT_TIMEOUT).then(|| "soon".to_string())
        });
        assert!(matches!(bad_timeout, Err(AppError::Config(_))));

        let bad_url =
            Config::default().with_env(|key| (key == ENV_API_URL).then(|| "ftp://x".to_string()));
        assert!(matches!(bad_url, Err(AppError::Config(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/enrol.toml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
