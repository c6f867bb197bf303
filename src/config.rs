//! Job configuration, read from `~/.reattrib/config.json`.
//!
//! Only the store credentials are mandatory; batch throttling, session
//! timings, and the alias-table path all have working defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::updater::BatchSettings;

/// Document-store endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Presence-ticker and idle-timeout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub heartbeat_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 30,
            idle_timeout_secs: 900,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub session: SessionConfig,
    /// Optional override; defaults to `aliases.json` next to the config.
    #[serde(default)]
    pub aliases_path: Option<PathBuf>,
}

fn config_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("could not determine home directory")?;
    Ok(home.join(".reattrib"))
}

impl JobConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from(&config_dir()?.join("config.json"))
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&raw)
            .map_err(|e| format!("invalid config at {}: {}", path.display(), e))
    }

    pub fn base_url(&self) -> Result<Url, String> {
        Url::parse(&self.store.base_url)
            .map_err(|e| format!("invalid store base URL '{}': {}", self.store.base_url, e))
    }

    /// Where the alias table lives. Missing file means an empty table.
    pub fn aliases_path(&self) -> Result<PathBuf, String> {
        match &self.aliases_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("aliases.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "store": {{ "baseUrl": "https://store.example.com/v1/", "apiKey": "k" }},
                "batch": {{ "chunkSize": 10, "chunkDelayMs": 500 }},
                "session": {{ "heartbeatSecs": 15 }},
                "aliasesPath": "/etc/reattrib/aliases.json"
            }}"#
        )
        .unwrap();

        let config = JobConfig::load_from(file.path()).unwrap();
        assert_eq!(config.store.api_key, "k");
        assert_eq!(config.batch.chunk_size, 10);
        assert_eq!(config.batch.chunk_delay_ms, 500);
        // Unset fields fall back to defaults
        assert_eq!(config.batch.update_delay_ms, 150);
        assert_eq!(config.session.heartbeat_secs, 15);
        assert_eq!(config.session.idle_timeout_secs, 900);
        assert_eq!(
            config.aliases_path().unwrap(),
            PathBuf::from("/etc/reattrib/aliases.json")
        );
        assert!(config.base_url().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "store": {{ "baseUrl": "https://store.example.com/v1/", "apiKey": "k" }} }}"#
        )
        .unwrap();

        let config = JobConfig::load_from(file.path()).unwrap();
        assert_eq!(config.batch.chunk_size, 25);
        assert_eq!(config.session.heartbeat_secs, 30);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = JobConfig::load_from(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = JobConfig::load_from(file.path()).unwrap_err();
        assert!(err.contains("invalid config"));
    }
}
