//! Configuration
//!
//! A single JSON file with serde defaults for every field, so an empty
//! `{}` is a valid config. Default location: `~/.gdocs-mcp/config.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read-only Drive scope plus the structured-content APIs.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/documents.readonly",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/presentations.readonly",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logical account id the credential store keys on.
    #[serde(default = "default_account")]
    pub account: String,

    /// OAuth client registered as a "Desktop app" in Google Cloud Console.
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Where token files live. Defaults to `~/.gdocs-mcp`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Timeout for metadata calls (search/list/files.get), seconds.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// Timeout for native content fetches, seconds.
    #[serde(default = "default_content_timeout")]
    pub content_timeout_secs: u64,

    /// Cap on in-flight requests to Google across all tool invocations.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// TTL for the converted-content cache, seconds. 0 disables caching.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_account() -> String {
    "default".to_string()
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_metadata_timeout() -> u64 {
    3
}

fn default_content_timeout() -> u64 {
    15
}

fn default_max_concurrent() -> usize {
    8
}

fn default_cache_ttl() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: default_account(),
            client_id: String::new(),
            client_secret: String::new(),
            scopes: default_scopes(),
            data_dir: None,
            metadata_timeout_secs: default_metadata_timeout(),
            content_timeout_secs: default_content_timeout(),
            max_concurrent_requests: default_max_concurrent(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location if it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_path()?;
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Internal(format!("failed to read config: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Internal(format!("failed to parse config JSON: {}", e)))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_data_dir()?.join("config.json"))
    }

    pub fn default_data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Internal("could not determine home directory".to_string()))?;
        Ok(home.join(".gdocs-mcp"))
    }

    /// Effective data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gets_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.account, "default");
        assert_eq!(config.metadata_timeout_secs, 3);
        assert_eq!(config.content_timeout_secs, 15);
        assert_eq!(config.max_concurrent_requests, 8);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.scopes.len(), DEFAULT_SCOPES.len());
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: Config = serde_json::from_str(
            r#"{"account": "work", "max_concurrent_requests": 2, "cache_ttl_secs": 0}"#,
        )
        .unwrap();
        assert_eq!(config.account, "work");
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(config.cache_ttl_secs, 0);
        // untouched fields keep defaults
        assert_eq!(config.metadata_timeout_secs, 3);
    }

    #[test]
    fn test_load_missing_explicit_path_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.json")));
        assert!(result.is_err());
    }
}
