//! Configuration management
//!
//! Settings for the storage client, read from `config.toml` in the user's
//! config directory. Every field is optional; a missing file yields defaults.
//! Key path priority: FMLTC_KEY_FILE environment variable > config.toml > `key.json`

use super::Result;
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_KEY_PATH: &str = "key.json";
pub const KEY_PATH_ENV: &str = "FMLTC_KEY_FILE";
pub const DEFAULT_STORAGE_API_URL: &str = "https://storage.googleapis.com/storage/v1";
pub const DEFAULT_UPLOAD_API_URL: &str = "https://storage.googleapis.com/upload/storage/v1";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Path of the service account key file
    pub key_path: Option<String>,
    /// Base URL of the storage JSON API
    pub storage_api_url: Option<String>,
    /// Base URL of the storage upload API
    pub upload_api_url: Option<String>,
    /// OAuth2 scope requested for access tokens
    pub scope: Option<String>,
    /// HTTP request timeout
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
                message: format!("Failed to parse config file: {}", e),
            })?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content = toml::to_string(self).map_err(|e| StorageError::ConfigSaveFailed {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        Ok(())
    }

    fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(config_dir.join("fmltc").join("config.toml"))
    }

    /// Resolve the service account key path
    pub fn key_path(&self) -> PathBuf {
        env::var(KEY_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .or_else(|| self.key_path.clone())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_PATH))
    }

    pub fn storage_api_url(&self) -> &str {
        self.storage_api_url
            .as_deref()
            .unwrap_or(DEFAULT_STORAGE_API_URL)
    }

    pub fn upload_api_url(&self) -> &str {
        self.upload_api_url.as_deref().unwrap_or(DEFAULT_UPLOAD_API_URL)
    }

    pub fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or(DEFAULT_SCOPE)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}
