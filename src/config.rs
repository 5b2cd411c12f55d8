//! Runtime configuration for resource ingestion
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables, then command-line overrides applied by the CLI.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_ALLOWED_EXTRA_FIELDS, DEFAULT_API_URL,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_ROLLBACK_DIR, ENV_API_URL, ENV_ROLLBACK_DIR,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Global configuration for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the resource directory API
    pub api_url: String,

    /// Header names accepted in addition to the record's own fields
    pub allowed_fields: BTreeSet<String>,

    /// Directory receiving rollback-id files
    pub rollback_dir: PathBuf,

    /// Timeout for each API request
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            allowed_fields: DEFAULT_ALLOWED_EXTRA_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            rollback_dir: PathBuf::from(DEFAULT_ROLLBACK_DIR),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Location of the per-user config file
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine the user config directory"))
    }

    /// Read a TOML config file; missing keys take their defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Defaults, then `config_file` if given, then environment overrides
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                Self::load_from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            debug!("{} overrides api_url", ENV_API_URL);
            self.api_url = url;
        }
        if let Some(dir) = lookup(ENV_ROLLBACK_DIR).filter(|v| !v.trim().is_empty()) {
            debug!("{} overrides rollback_dir", ENV_ROLLBACK_DIR);
            self.rollback_dir = PathBuf::from(dir);
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(Error::configuration("api_url must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::configuration(format!(
                "api_url must start with http:// or https://, got \"{url}\""
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::configuration(
                "request_timeout_secs must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_rollback_dir(mut self, rollback_dir: impl Into<PathBuf>) -> Self {
        self.rollback_dir = rollback_dir.into();
        self
    }

    pub fn with_allowed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.allowed_fields.contains("GRADELEVEL"));
        assert_eq!(config.rollback_dir, PathBuf::from("rollback_ids"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "api_url = \"https://api.example.org\"").unwrap();
        writeln!(file, "allowed_fields = [\"GRADELEVEL\", \"notes\"]").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.api_url, "https://api.example.org");
        assert_eq!(config.allowed_fields.len(), 2);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = \"soon\"").unwrap();

        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "https://staging.example.org/api"),
            (ENV_ROLLBACK_DIR, ""),
        ]);

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://staging.example.org/api");
        assert_eq!(config.rollback_dir, PathBuf::from(DEFAULT_ROLLBACK_DIR));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Config::default().with_api_url("").validate().is_err());
        assert!(Config::default().with_api_url("ftp://x").validate().is_err());

        let mut config = Config::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_rollback_dir("/tmp/ids")
            .with_allowed_fields(["notes"]);
        assert_eq!(config.rollback_dir, PathBuf::from("/tmp/ids"));
        assert_eq!(config.allowed_fields, BTreeSet::from(["notes".to_string()]));
    }
}
