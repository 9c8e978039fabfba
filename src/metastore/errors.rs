//! Metadata store error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type for metadata store operations.
pub type MetaStoreResult<T> = Result<T, MetaStoreError>;

/// Errors raised by the metadata tables.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetaStoreError {
    /// A dataset row with this id already exists.
    #[error("Dataset '{0}' already exists")]
    DatasetExists(Uuid),

    /// A version row with this id already exists.
    #[error("Version '{0}' already exists")]
    VersionExists(Uuid),

    /// (dataset_id, tag) uniqueness violation.
    #[error("Tag '{tag}' already exists for this dataset")]
    TagExists { tag: String },

    /// Lock poisoning or other unexpected internal failure.
    #[error("Metadata store internal error: {0}")]
    Internal(String),
}

impl MetaStoreError {
    pub(crate) fn poisoned() -> Self {
        Self::Internal("lock poisoned".to_string())
    }
}
