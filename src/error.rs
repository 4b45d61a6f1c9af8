use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("TimeError: {0}")]
    Time(#[from] TimeError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("AuthError: {0}")]
    Auth(#[from] AuthError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
}

#[derive(Error, Debug, PartialEq)]
pub enum TimeError {
    #[error("Epoch milliseconds out of range: {ms}")]
    OutOfRange { ms: i64 },
    #[error("Timestamp '{value}' has no timezone offset")]
    MissingTimezone { value: String },
    #[error("Invalid timestamp '{value}': {message}")]
    Parse { value: String, message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration save failed: {message}")]
    ConfigSaveFailed { message: String },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Malformed service account key: {message}")]
    MalformedKey { message: String },
    #[error("Invalid private key in service account key: {message}")]
    InvalidPrivateKey { message: String },
    #[error("Failed to sign token request: {message}")]
    JwtSign { message: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("HTTP error: {status} {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Authentication failed")]
    Unauthorized {
        status: u16,
        endpoint: String,
        server_message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Time(_) => ErrorSeverity::Low,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Auth(_) => ErrorSeverity::Critical,
            AppError::Api(api_error) => match api_error {
                ApiError::Unauthorized { .. } => ErrorSeverity::High,
                ApiError::Timeout { .. } => ErrorSeverity::Medium,
                ApiError::Http { status, .. } if *status >= 500 => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Storage(StorageError::FileIo { path, .. }) => Some(format!(
                "Check that '{}' exists, or point FMLTC_KEY_FILE at the service account key",
                path
            )),
            AppError::Auth(AuthError::MalformedKey { .. } | AuthError::InvalidPrivateKey { .. }) => {
                Some("Download a fresh JSON key for the service account".to_string())
            }
            AppError::Api(ApiError::Unauthorized { .. }) => Some(
                "The service account was rejected; check that it has storage access".to_string(),
            ),
            AppError::Time(TimeError::MissingTimezone { .. }) => {
                Some("Add an explicit offset such as 'Z' or '+00:00'".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_error_display() {
        let err = TimeError::OutOfRange { ms: i64::MAX };
        assert_eq!(
            format!("{}", err),
            format!("Epoch milliseconds out of range: {}", i64::MAX)
        );

        let err = TimeError::MissingTimezone {
            value: "2020-01-01T00:00:00".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Timestamp '2020-01-01T00:00:00' has no timezone offset"
        );
    }

    #[test]
    fn test_api_error_display() {
        let api_err = ApiError::Unauthorized {
            status: 401,
            endpoint: "endpoint".to_string(),
            server_message: "message".to_string(),
        };
        assert!(matches!(api_err, ApiError::Unauthorized { .. }));
        if let ApiError::Unauthorized {
            status,
            endpoint,
            server_message,
        } = api_err
        {
            assert_eq!(status, 401);
            assert_eq!(endpoint, "endpoint");
            assert_eq!(server_message, "message");
        };

        let api_err = ApiError::Http {
            status: 404,
            endpoint: "endpoint".to_string(),
            message: "No such object".to_string(),
        };
        assert_eq!(format!("{}", api_err), "HTTP error: 404 No such object");
    }

    #[test]
    fn test_app_error_display_auth() {
        let app_err = AppError::Auth(AuthError::MalformedKey {
            message: "missing field `private_key`".to_string(),
        });
        assert_eq!(
            format!("{}", app_err),
            "AuthError: Malformed service account key: missing field `private_key`"
        );
        assert_eq!(app_err.severity(), ErrorSeverity::Critical);
        assert!(app_err.troubleshooting_hint().is_some());
    }

    #[test]
    fn test_app_error_severity() {
        let app_err = AppError::Api(ApiError::Http {
            status: 503,
            endpoint: "download".to_string(),
            message: "unavailable".to_string(),
        });
        assert_eq!(app_err.severity(), ErrorSeverity::High);

        let app_err = AppError::Api(ApiError::Http {
            status: 404,
            endpoint: "download".to_string(),
            message: "not found".to_string(),
        });
        assert_eq!(app_err.severity(), ErrorSeverity::Medium);
        assert!(app_err.troubleshooting_hint().is_none());

        let app_err = AppError::Time(TimeError::OutOfRange { ms: 0 });
        assert_eq!(app_err.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_storage_error_hint_names_path() {
        let app_err = AppError::Storage(StorageError::FileIo {
            path: "key.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });
        let hint = app_err.troubleshooting_hint().expect("hint expected");
        assert!(hint.contains("key.json"));
    }
}
