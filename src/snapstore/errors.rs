//! Snapshot store error types.

use std::io;

use thiserror::Error;

/// Result type for snapshot store operations.
pub type SnapshotStoreResult<T> = Result<T, SnapshotStoreError>;

/// Errors raised by the snapshot record log.
#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    /// Disk I/O failure.
    #[error("Snapshot store I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Checksum mismatch or truncated record. Reads abort; corruption is
    /// never ignored.
    #[error("Snapshot store corruption at offset {offset}: {detail}")]
    Corruption { offset: u64, detail: String },

    /// A record payload failed to (de)serialize.
    #[error("Snapshot record serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    /// Lock poisoning or other unexpected internal failure.
    #[error("Snapshot store internal error: {0}")]
    Internal(String),
}

impl SnapshotStoreError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn corruption(offset: u64, detail: impl Into<String>) -> Self {
        Self::Corruption {
            offset,
            detail: detail.into(),
        }
    }

    pub(crate) fn poisoned() -> Self {
        Self::Internal("lock poisoned".to_string())
    }
}
