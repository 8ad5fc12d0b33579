//! Error type for batch operations.

use thiserror::Error;

/// Errors raised by the batch driver.
///
/// Per-N numerical failures are not errors at this level; they are collected
/// into [`BatchResult::failures`](crate::BatchResult::failures).
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeConfig(#[from] toml::ser::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid batch configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Pack(#[from] u_circlepack_core::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
