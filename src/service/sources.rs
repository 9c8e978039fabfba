//! Collaborator interfaces consumed by the versioning core.
//!
//! The draft item collection and caller identity belong to the surrounding
//! backend; the core consumes them through these two narrow traits. The
//! in-memory implementations back tests and single-process deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::errors::{VersioningError, VersioningResult};
use crate::model::DatasetItem;

/// Reads the current draft items of a dataset.
pub trait DraftItemSource: Send + Sync {
    fn draft_items(&self, dataset_id: Uuid) -> VersioningResult<Vec<DatasetItem>>;
}

/// Resolves caller identity for attribution.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> String;
    fn current_workspace(&self) -> String;
}

/// In-memory draft collection keyed by dataset id.
#[derive(Default)]
pub struct MemoryDraftSource {
    drafts: RwLock<HashMap<Uuid, Vec<DatasetItem>>>,
}

impl MemoryDraftSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the draft item set of a dataset.
    pub fn put_items(&self, dataset_id: Uuid, items: Vec<DatasetItem>) -> VersioningResult<()> {
        let mut drafts = self
            .drafts
            .write()
            .map_err(|_| VersioningError::Internal("lock poisoned".to_string()))?;
        drafts.insert(dataset_id, items);
        Ok(())
    }

    /// Appends items to the draft of a dataset.
    pub fn add_items(&self, dataset_id: Uuid, items: Vec<DatasetItem>) -> VersioningResult<()> {
        let mut drafts = self
            .drafts
            .write()
            .map_err(|_| VersioningError::Internal("lock poisoned".to_string()))?;
        drafts.entry(dataset_id).or_default().extend(items);
        Ok(())
    }
}

impl DraftItemSource for MemoryDraftSource {
    fn draft_items(&self, dataset_id: Uuid) -> VersioningResult<Vec<DatasetItem>> {
        let drafts = self
            .drafts
            .read()
            .map_err(|_| VersioningError::Internal("lock poisoned".to_string()))?;
        Ok(drafts.get(&dataset_id).cloned().unwrap_or_default())
    }
}

/// Fixed identity, for tests and single-tenant deployments.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    pub user: String,
    pub workspace: String,
}

impl StaticIdentity {
    pub fn new(user: impl Into<String>, workspace: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            workspace: workspace.into(),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> String {
        self.user.clone()
    }

    fn current_workspace(&self) -> String {
        self.workspace.clone()
    }
}
