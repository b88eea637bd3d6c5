//! Log source abstraction.

use async_trait::async_trait;
use paceline_core::{LogError, ProgressLog};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while loading a progress log.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The log parsed but violates the data contract
    #[error("invalid log: {0}")]
    Log(#[from] LogError),

    /// The source reported a failure instead of data
    #[error("source rejected request: {0}")]
    Rejected(String),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Where progress logs come from.
///
/// Each call to [`load`](LogSource::load) returns a fresh, validated snapshot;
/// nothing is cached between calls.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Load and validate the current log.
    async fn load(&self) -> Result<ProgressLog>;

    /// Human-readable description of the source, for logs.
    fn describe(&self) -> String;
}
