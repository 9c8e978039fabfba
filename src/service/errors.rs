//! Versioning error taxonomy.
//!
//! - NotFound: unknown dataset, or a hash that does not resolve within a
//!   dataset's lineage. Surfaced as-is.
//! - Conflict: (dataset_id, tag) already taken; names the tag.
//! - Validation: structured list of violations, not one opaque message.
//! - Storage/Internal: unexpected store failure; not retried here.

use thiserror::Error;
use uuid::Uuid;

use crate::metastore::MetaStoreError;
use crate::snapstore::SnapshotStoreError;

/// Result type for versioning operations.
pub type VersioningResult<T> = Result<T, VersioningError>;

/// Errors surfaced by the Dataset Version Service.
#[derive(Debug, Error)]
pub enum VersioningError {
    /// The dataset does not exist.
    #[error("Dataset '{0}' not found")]
    DatasetNotFound(Uuid),

    /// The version hash does not resolve within the dataset.
    #[error("Version '{version_hash}' not found for this dataset")]
    VersionNotFound { version_hash: String },

    /// (dataset_id, tag) already exists.
    #[error("Tag '{tag}' already exists for this dataset")]
    TagConflict { tag: String },

    /// One or more input rule violations.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Snapshot store failure.
    #[error(transparent)]
    Storage(#[from] SnapshotStoreError),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VersioningError {
    /// A single-violation validation error.
    pub fn validation(violation: impl Into<String>) -> Self {
        Self::Validation(vec![violation.into()])
    }
}

impl From<MetaStoreError> for VersioningError {
    fn from(e: MetaStoreError) -> Self {
        match e {
            MetaStoreError::TagExists { tag } => Self::TagConflict { tag },
            other => Self::Internal(other.to_string()),
        }
    }
}
