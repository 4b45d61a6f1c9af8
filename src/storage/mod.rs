//! Storage layer for fmltc-util
//!
//! Handles configuration, service account credentials and the cloud storage
//! client. Configuration is a TOML file; credentials are the JSON key file
//! issued for the service account.

use crate::error::StorageError;

pub mod client;
pub mod config;
pub mod credentials;
pub mod objects;

type Result<T> = std::result::Result<T, StorageError>;
