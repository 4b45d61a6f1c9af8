//! # fmltc-util
//!
//! Shared helpers for the FIRST Machine Learning Toolchain.
//!
//! ## Modules
//!
//! - [`utils`]: logging wrapper, epoch-millisecond conversion, label maps, count merging
//! - [`storage`]: service account credentials, configuration, cloud storage client
//! - [`error`]: hierarchical error system with troubleshooting hints

pub use error::AppError;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use fmltc_util::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Result;
    pub use crate::error::AppError;

    pub use crate::storage::client::{StorageClient, storage_client};
    pub use crate::storage::config::Config;
    pub use crate::storage::credentials::ServiceAccountKey;
    pub use crate::storage::objects::{ObjectInfo, ObjectStore, upload_label_map};

    pub use crate::utils::counts::{LabelCounts, extend_label_counts, merge_label_counts};
    pub use crate::utils::label_map::make_label_map;
    pub use crate::utils::logging::Logger;
    pub use crate::utils::time::{datetime_from_ms, ms_from_datetime, ms_from_rfc3339};
}

/// Storage layer - credentials, configuration and the cloud storage client.
pub mod storage;

/// Utilities layer - stateless helpers used across the application.
pub mod utils;

/// Error handling - hierarchical error system.
pub mod error;

/// Convenient Result type alias using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
