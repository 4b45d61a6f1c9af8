//! Cloud storage client authenticated with a service account key.
//!
//! Uses `jsonwebtoken` to sign the RS256 assertion for the OAuth2 JWT-bearer
//! grant and `reqwest` for the storage JSON API.

use crate::error::{ApiError, AuthError};
use crate::storage::config::Config;
use crate::storage::credentials::ServiceAccountKey;
use crate::storage::objects::{ObjectInfo, ObjectStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const USER_AGENT: &str = concat!("fmltc-util/", env!("CARGO_PKG_VERSION"));
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the server-reported expiry.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Build a client from the key file named by the default configuration.
///
/// Each call reads the key again and returns a fresh client.
pub fn storage_client() -> crate::Result<StorageClient> {
    let config = Config::load(None)?;
    StorageClient::from_service_account_json(config.key_path(), &config)
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

pub struct StorageClient {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    storage_api_url: String,
    upload_api_url: String,
    scope: String,
    timeout_secs: u64,
    cached_token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("key", &self.key)
            .field("storage_api_url", &self.storage_api_url)
            .field("upload_api_url", &self.upload_api_url)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    pub fn new(key: ServiceAccountKey, config: &Config) -> crate::Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            AuthError::InvalidPrivateKey {
                message: e.to_string(),
            }
        })?;

        let timeout_secs = config.timeout_seconds();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Http {
                status: 0,
                endpoint: "client_init".to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        log::debug!("Storage client created for {}", key.client_email);

        Ok(StorageClient {
            client,
            key,
            encoding_key,
            storage_api_url: config.storage_api_url().trim_end_matches('/').to_string(),
            upload_api_url: config.upload_api_url().trim_end_matches('/').to_string(),
            scope: config.scope().to_string(),
            timeout_secs,
            cached_token: Mutex::new(None),
        })
    }

    pub fn from_service_account_json<P: AsRef<Path>>(
        path: P,
        config: &Config,
    ) -> crate::Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        Self::new(key, config)
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    /// Return a valid access token, exchanging a fresh assertion when the
    /// cached one is missing or about to expire.
    pub async fn access_token(&self) -> crate::Result<String> {
        let now = Utc::now();
        if let Some(token) = self.cached_access_token(now) {
            return Ok(token);
        }

        let assertion = self.generate_assertion(now)?;
        let endpoint = self.key.token_uri.clone();
        let response = self
            .client
            .post(&endpoint)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| self.convert_send_error(e, &endpoint))?;
        let response = self.check_status(response, &endpoint).await?;
        let payload: TokenResponse = response.json().await.map_err(|e| ApiError::Http {
            status: 0,
            endpoint: endpoint.clone(),
            message: format!("Failed to parse token response: {}", e),
        })?;

        match token_expiry(now, payload.expires_in) {
            Some(expires_at) => {
                log::debug!(
                    "Obtained access token for {} valid until {}",
                    self.key.client_email,
                    expires_at
                );
                self.store_access_token(payload.access_token.clone(), expires_at);
            }
            None => log::debug!(
                "Obtained access token for {} without a usable expiry; not caching it",
                self.key.client_email
            ),
        }

        Ok(payload.access_token)
    }

    fn store_access_token(&self, token: String, expires_at: DateTime<Utc>) {
        let mut cached = self
            .cached_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *cached = Some(CachedToken { token, expires_at });
    }

    fn cached_access_token(&self, now: DateTime<Utc>) -> Option<String> {
        let cached = self
            .cached_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cached
            .as_ref()
            .filter(|token| token.expires_at > now)
            .map(|token| token.token.clone())
    }

    fn generate_assertion(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| AuthError::JwtSign {
            message: e.to_string(),
        })
    }

    pub async fn upload_object(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> crate::Result<ObjectInfo> {
        let url = object_url(&self.upload_api_url, bucket, None)?;
        let endpoint = format!("upload {}/{}", bucket, name);
        let request = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", name)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data);
        let response = self.send_authorized(request, &endpoint).await?;
        Ok(self.parse_json(response, &endpoint).await?)
    }

    pub async fn download_object(&self, bucket: &str, name: &str) -> crate::Result<Vec<u8>> {
        let url = object_url(&self.storage_api_url, bucket, Some(name))?;
        let endpoint = format!("download {}/{}", bucket, name);
        let request = self.client.get(url).query(&[("alt", "media")]);
        let response = self.send_authorized(request, &endpoint).await?;
        let bytes = response.bytes().await.map_err(|e| ApiError::Http {
            status: 0,
            endpoint: endpoint.clone(),
            message: format!("Failed to read object body: {}", e),
        })?;
        Ok(bytes.to_vec())
    }

    pub async fn delete_object(&self, bucket: &str, name: &str) -> crate::Result<()> {
        let url = object_url(&self.storage_api_url, bucket, Some(name))?;
        let endpoint = format!("delete {}/{}", bucket, name);
        self.send_authorized(self.client.delete(url), &endpoint)
            .await?;
        Ok(())
    }

    /// List every object under `prefix`, following page tokens.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> crate::Result<Vec<ObjectInfo>> {
        let url = object_url(&self.storage_api_url, bucket, None)?;
        let endpoint = format!("list {}/{}", bucket, prefix);
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(url.clone()).query(&[("prefix", prefix)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = self.send_authorized(request, &endpoint).await?;
            let page: ObjectList = self.parse_json(response, &endpoint).await?;
            objects.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn send_authorized(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> crate::Result<Response> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.convert_send_error(e, endpoint))?;
        Ok(self.check_status(response, endpoint).await?)
    }

    async fn check_status(&self, response: Response, endpoint: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::warn!("{} failed with status {}", endpoint, status);

        match status.as_u16() {
            401 | 403 => Err(ApiError::Unauthorized {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                server_message: error_text,
            }),
            408 | 504 => Err(ApiError::Timeout {
                timeout_secs: self.timeout_secs,
                endpoint: endpoint.to_string(),
            }),
            _ => Err(ApiError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                message: error_text,
            }),
        }
    }

    async fn parse_json<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        response.json::<T>().await.map_err(|e| ApiError::Http {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn convert_send_error(&self, error: reqwest::Error, endpoint: &str) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                timeout_secs: self.timeout_secs,
                endpoint: endpoint.to_string(),
            }
        } else {
            ApiError::Http {
                status: error.status().map(|s| s.as_u16()).unwrap_or(0),
                endpoint: endpoint.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Cache deadline for a token the server says lives `expires_in` seconds.
///
/// The token never outlives the assertion it was exchanged for, so the
/// server value is clamped to the assertion lifetime. `None` means the token
/// should not be cached.
fn token_expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    let lifetime = expires_in
        .unwrap_or(ASSERTION_LIFETIME_SECS)
        .clamp(0, ASSERTION_LIFETIME_SECS);
    let delta = ChronoDuration::try_seconds(lifetime - TOKEN_REFRESH_MARGIN_SECS)?;
    now.checked_add_signed(delta).filter(|expires_at| *expires_at > now)
}

/// `{base}/b/{bucket}/o[/{name}]`, with `/` inside the object name escaped.
fn object_url(base: &str, bucket: &str, name: Option<&str>) -> Result<Url, ApiError> {
    let invalid = |message: String| ApiError::Http {
        status: 0,
        endpoint: base.to_string(),
        message,
    };

    let mut url = Url::parse(base).map_err(|e| invalid(format!("Invalid base URL: {}", e)))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| invalid("Base URL cannot have a path".to_string()))?;
        segments.pop_if_empty().push("b").push(bucket).push("o");
        if let Some(name) = name {
            segments.push(name);
        }
    }
    Ok(url)
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> crate::Result<ObjectInfo> {
        self.upload_object(bucket, name, data, content_type).await
    }

    async fn download(&self, bucket: &str, name: &str) -> crate::Result<Vec<u8>> {
        self.download_object(bucket, name).await
    }

    async fn delete(&self, bucket: &str, name: &str) -> crate::Result<()> {
        self.delete_object(bucket, name).await
    }

    async fn list(&self, bucket: &str, prefix: &str) -> crate::Result<Vec<ObjectInfo>> {
        self.list_objects(bucket, prefix).await
    }
}
