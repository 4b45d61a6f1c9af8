//! Service account credentials
//!
//! Parses the JSON key file downloaded for a service account. Only the fields
//! needed to mint access tokens are required.

use crate::error::{AuthError, StorageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SERVICE_ACCOUNT_TYPE: &str = "service_account";

#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Read and parse a key file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| StorageError::FileIo {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        Ok(Self::from_json(&content)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| AuthError::MalformedKey {
                message: e.to_string(),
            })?;

        if let Some(key_type) = key.key_type.as_deref() {
            if key_type != SERVICE_ACCOUNT_TYPE {
                return Err(AuthError::MalformedKey {
                    message: format!("expected type '{}', found '{}'", SERVICE_ACCOUNT_TYPE, key_type),
                });
            }
        }
        if key.client_email.trim().is_empty() {
            return Err(AuthError::MalformedKey {
                message: "client_email is empty".to_string(),
            });
        }
        if key.private_key.trim().is_empty() {
            return Err(AuthError::MalformedKey {
                message: "private_key is empty".to_string(),
            });
        }

        Ok(key)
    }
}

// Keep the private key out of logs
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}
