//! Commit, tagging and listing orchestration.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use super::errors::{VersioningError, VersioningResult};
use super::sources::{DraftItemSource, IdentityProvider};
use crate::hasher::{self, compute_delta};
use crate::metastore::MetadataStore;
use crate::model::{
    DatasetItem, DatasetVersion, DatasetVersionView, ItemSnapshotRecord, Page, VersionDelta,
    VersionTag, LATEST_TAG,
};
use crate::observability::Logger;
use crate::snapstore::SnapshotStore;

/// Upper bound on `change_description` length.
pub const MAX_CHANGE_DESCRIPTION_LEN: usize = 1000;

/// Input for `commit_version`.
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    pub tag: Option<String>,
    pub change_description: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// The Dataset Version Service.
///
/// Holds the per-dataset serialization boundary: commit and tag mutations
/// for one dataset run under that dataset's lock, so two concurrent commits
/// can never both move `latest`, and a tag-uniqueness check can never race
/// the matching insert.
pub struct DatasetVersionService {
    meta: Arc<MetadataStore>,
    snapshots: Arc<SnapshotStore>,
    drafts: Arc<dyn DraftItemSource>,
    identity: Arc<dyn IdentityProvider>,
    dataset_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl DatasetVersionService {
    pub fn new(
        meta: Arc<MetadataStore>,
        snapshots: Arc<SnapshotStore>,
        drafts: Arc<dyn DraftItemSource>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            meta,
            snapshots,
            drafts,
            identity,
            dataset_locks: Mutex::new(HashMap::new()),
        }
    }

    // ------------------------------------------------------------------
    // commit
    // ------------------------------------------------------------------

    /// Commits the current draft of a dataset as a new immutable version.
    ///
    /// Sequence: validate → check explicit tag uniqueness → read draft →
    /// hash → copy snapshot rows → insert version row → move `latest` →
    /// create explicit tag. The version row insert is the visibility gate:
    /// a failure before it leaves only orphan snapshot rows that a retried
    /// commit reuses.
    ///
    /// Supplying `tag = "latest"` is accepted as a redundant duplicate of
    /// the automatic latest assignment; no extra tag row is written.
    ///
    /// # Errors
    ///
    /// `DatasetNotFound` for an unknown dataset, `TagConflict` when the
    /// explicit tag is already taken (nothing is persisted in that case),
    /// `Validation` for a blank tag or an oversized description.
    pub fn commit_version(
        &self,
        dataset_id: Uuid,
        request: CommitRequest,
    ) -> VersioningResult<DatasetVersionView> {
        let explicit_tag = Self::validate_commit(&request)?;

        if self.meta.dataset(dataset_id)?.is_none() {
            return Err(VersioningError::DatasetNotFound(dataset_id));
        }

        let lock = self.dataset_lock(dataset_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| VersioningError::Internal("dataset lock poisoned".to_string()))?;

        // Rule violations are detected before any durable write.
        if let Some(tag) = &explicit_tag {
            if self.meta.tag(dataset_id, tag)?.is_some() {
                return Err(VersioningError::TagConflict { tag: tag.clone() });
            }
        }

        let items = self.drafts.draft_items(dataset_id)?;
        let version_hash = hasher::hash_items(&items);

        let prior = self.meta.newest_version(dataset_id)?;
        let version_id = match &prior {
            // First version: id equals the dataset id, so both stores mint
            // the identifier without a coordination round trip.
            None => dataset_id,
            Some(_) => Uuid::new_v4(),
        };

        let prior_rows = match &prior {
            Some(p) => self.snapshots.rows_for_version(p.id)?,
            None => Vec::new(),
        };
        let rows = Self::build_snapshot_rows(dataset_id, version_id, &items, &prior_rows);

        // Snapshot first; the version row below makes it visible.
        self.snapshots.copy_rows(rows)?;

        let now = Utc::now();
        let created_by = self.identity.current_user();
        let version = DatasetVersion {
            id: version_id,
            dataset_id,
            version_hash: version_hash.clone(),
            change_description: request.change_description,
            metadata: request.metadata,
            items_count: 0,
            items_added: 0,
            items_modified: 0,
            items_deleted: 0,
            created_at: now,
            created_by: created_by.clone(),
        };
        self.meta.insert_version(version.clone())?;

        self.meta
            .move_latest(dataset_id, version_id, &created_by, now)?;

        if let Some(tag) = &explicit_tag {
            self.meta.insert_tag(VersionTag {
                dataset_id,
                tag: tag.clone(),
                version_id,
                created_at: now,
                created_by: created_by.clone(),
            })?;
        }

        let tags = self.meta.tags_for_version(version_id)?;
        Logger::info(
            "version_committed",
            &[
                ("dataset_id", &dataset_id.to_string()),
                ("version_hash", &version_hash),
                ("version_id", &version_id.to_string()),
            ],
        );

        Ok(DatasetVersionView { version, tags })
    }

    /// Builds the snapshot rows for a new version.
    ///
    /// `dataset_item_id` carries item identity across versions. A draft
    /// item whose content digest matches its row in the prior version keeps
    /// that row id; changed or new content gets a fresh row id.
    fn build_snapshot_rows(
        dataset_id: Uuid,
        version_id: Uuid,
        items: &[DatasetItem],
        prior_rows: &[ItemSnapshotRecord],
    ) -> Vec<ItemSnapshotRecord> {
        let prior_by_item: HashMap<Uuid, &ItemSnapshotRecord> = prior_rows
            .iter()
            .map(|r| (r.dataset_item_id, r))
            .collect();

        items
            .iter()
            .map(|item| {
                let content_digest = hasher::item_digest(item);
                let row_id = match prior_by_item.get(&item.id) {
                    Some(prior) if prior.content_digest == content_digest => prior.id,
                    _ => Uuid::new_v4(),
                };
                ItemSnapshotRecord {
                    id: row_id,
                    dataset_item_id: item.id,
                    dataset_id,
                    dataset_version_id: version_id,
                    data: item.data.clone(),
                    metadata: item.metadata.clone(),
                    source: item.source.clone(),
                    trace_id: item.trace_id,
                    span_id: item.span_id,
                    content_digest,
                    created_at: item.created_at,
                    created_by: item.created_by.clone(),
                }
            })
            .collect()
    }

    fn validate_commit(request: &CommitRequest) -> VersioningResult<Option<String>> {
        let mut violations = Vec::new();

        if let Some(description) = &request.change_description {
            if description.chars().count() > MAX_CHANGE_DESCRIPTION_LEN {
                violations.push(format!(
                    "Change description must not exceed {} characters",
                    MAX_CHANGE_DESCRIPTION_LEN
                ));
            }
        }

        let explicit_tag = match &request.tag {
            Some(tag) if tag.trim().is_empty() => {
                violations.push("Tag must not be blank".to_string());
                None
            }
            // Redundant spelling of the automatic behavior; no tag row.
            Some(tag) if tag == LATEST_TAG => None,
            Some(tag) => Some(tag.clone()),
            None => None,
        };

        if violations.is_empty() {
            Ok(explicit_tag)
        } else {
            Err(VersioningError::Validation(violations))
        }
    }

    // ------------------------------------------------------------------
    // listing
    // ------------------------------------------------------------------

    /// One page of a dataset's versions, newest first. 1-indexed page.
    pub fn list_versions(
        &self,
        dataset_id: Uuid,
        page: u64,
        size: u64,
    ) -> VersioningResult<Page<DatasetVersionView>> {
        let mut violations = Vec::new();
        if page == 0 {
            violations.push("Page must be >= 1".to_string());
        }
        if size == 0 {
            violations.push("Page size must be >= 1".to_string());
        }
        if !violations.is_empty() {
            return Err(VersioningError::Validation(violations));
        }

        if self.meta.dataset(dataset_id)?.is_none() {
            return Err(VersioningError::DatasetNotFound(dataset_id));
        }

        let (versions, total) = self.meta.list_versions(dataset_id, page, size)?;
        let mut content = Vec::with_capacity(versions.len());
        for version in versions {
            let tags = self.meta.tags_for_version(version.id)?;
            content.push(DatasetVersionView { version, tags });
        }

        Ok(Page {
            content,
            page,
            size,
            total,
        })
    }

    // ------------------------------------------------------------------
    // tags
    // ------------------------------------------------------------------

    /// Creates a named tag pointing at the version resolved by hash.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank or reserved tag name, `DatasetNotFound` /
    /// `VersionNotFound` when resolution fails, `TagConflict` when the pair
    /// (dataset, tag) is already taken.
    pub fn create_version_tag(
        &self,
        dataset_id: Uuid,
        version_hash: &str,
        tag: &str,
    ) -> VersioningResult<()> {
        if tag.trim().is_empty() {
            return Err(VersioningError::validation("Tag must not be blank"));
        }
        if tag == LATEST_TAG {
            // The reserved pointer is managed by commit alone.
            return Err(VersioningError::validation(format!(
                "Tag '{}' is reserved",
                LATEST_TAG
            )));
        }

        if self.meta.dataset(dataset_id)?.is_none() {
            return Err(VersioningError::DatasetNotFound(dataset_id));
        }

        let lock = self.dataset_lock(dataset_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| VersioningError::Internal("dataset lock poisoned".to_string()))?;

        let version = self
            .meta
            .version_by_hash(dataset_id, version_hash)?
            .ok_or_else(|| VersioningError::VersionNotFound {
                version_hash: version_hash.to_string(),
            })?;

        let now = Utc::now();
        self.meta.insert_tag(VersionTag {
            dataset_id,
            tag: tag.to_string(),
            version_id: version.id,
            created_at: now,
            created_by: self.identity.current_user(),
        })?;

        Logger::info(
            "tag_created",
            &[
                ("dataset_id", &dataset_id.to_string()),
                ("tag", tag),
                ("version_id", &version.id.to_string()),
            ],
        );
        Ok(())
    }

    /// Deletes a named tag. Deleting an absent tag is a no-op success;
    /// deleting `latest` is a validation error.
    pub fn delete_version_tag(
        &self,
        dataset_id: Uuid,
        version_hash: &str,
        tag: &str,
    ) -> VersioningResult<()> {
        if tag == LATEST_TAG {
            return Err(VersioningError::validation(format!(
                "Tag '{}' cannot be deleted",
                LATEST_TAG
            )));
        }

        if self.meta.dataset(dataset_id)?.is_none() {
            return Err(VersioningError::DatasetNotFound(dataset_id));
        }

        let lock = self.dataset_lock(dataset_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| VersioningError::Internal("dataset lock poisoned".to_string()))?;

        if self
            .meta
            .version_by_hash(dataset_id, version_hash)?
            .is_none()
        {
            return Err(VersioningError::VersionNotFound {
                version_hash: version_hash.to_string(),
            });
        }

        let removed = self.meta.delete_tag(dataset_id, tag)?;
        if removed {
            Logger::info(
                "tag_deleted",
                &[("dataset_id", &dataset_id.to_string()), ("tag", tag)],
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // derived deltas
    // ------------------------------------------------------------------

    /// Derives the change counters of a version relative to its
    /// predecessor, from per-item content digests. Never persisted; commit
    /// latency does not depend on this.
    pub fn version_delta(
        &self,
        dataset_id: Uuid,
        version_hash: &str,
    ) -> VersioningResult<VersionDelta> {
        if self.meta.dataset(dataset_id)?.is_none() {
            return Err(VersioningError::DatasetNotFound(dataset_id));
        }

        let version = self
            .meta
            .version_by_hash(dataset_id, version_hash)?
            .ok_or_else(|| VersioningError::VersionNotFound {
                version_hash: version_hash.to_string(),
            })?;

        let (all, _) = self.meta.list_versions(dataset_id, 1, u64::MAX)?;
        let position = all.iter().position(|v| v.id == version.id);
        let predecessor = position.and_then(|p| all.get(p + 1));

        let prev_rows = match predecessor {
            Some(prev) => self.snapshots.rows_for_version(prev.id)?,
            None => Vec::new(),
        };
        let next_rows = self.snapshots.rows_for_version(version.id)?;

        Ok(compute_delta(&prev_rows, &next_rows))
    }

    fn dataset_lock(&self, dataset_id: Uuid) -> VersioningResult<Arc<Mutex<()>>> {
        let mut locks = self
            .dataset_locks
            .lock()
            .map_err(|_| VersioningError::Internal("lock table poisoned".to_string()))?;
        Ok(locks.entry(dataset_id).or_default().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dataset;
    use crate::service::sources::{MemoryDraftSource, StaticIdentity};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        meta: Arc<MetadataStore>,
        snapshots: Arc<SnapshotStore>,
        drafts: Arc<MemoryDraftSource>,
        service: DatasetVersionService,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let meta = Arc::new(MetadataStore::new());
        let snapshots = Arc::new(SnapshotStore::open(dir.path()).unwrap());
        let drafts = Arc::new(MemoryDraftSource::new());
        let service = DatasetVersionService::new(
            meta.clone(),
            snapshots.clone(),
            drafts.clone(),
            Arc::new(StaticIdentity::new("tester", "default")),
        );
        Fixture {
            _dir: dir,
            meta,
            snapshots,
            drafts,
            service,
        }
    }

    fn register_dataset(f: &Fixture) -> Uuid {
        let dataset = Dataset {
            id: Uuid::new_v4(),
            name: "eval-set".to_string(),
            created_at: Utc::now(),
            created_by: "owner".to_string(),
        };
        let id = dataset.id;
        f.meta.create_dataset(dataset).unwrap();
        id
    }

    fn draft_item(dataset_id: Uuid, input: &str) -> DatasetItem {
        DatasetItem {
            id: Uuid::new_v4(),
            dataset_id,
            data: serde_json::json!({"input": input}),
            metadata: BTreeMap::new(),
            source: Some("sdk".to_string()),
            trace_id: None,
            span_id: None,
            created_at: Utc::now(),
            created_by: "owner".to_string(),
        }
    }

    #[test]
    fn test_first_version_id_equals_dataset_id() {
        let f = fixture();
        let dataset_id = register_dataset(&f);
        f.drafts
            .put_items(dataset_id, vec![draft_item(dataset_id, "q1")])
            .unwrap();

        let view = f
            .service
            .commit_version(dataset_id, CommitRequest::default())
            .unwrap();
        assert_eq!(view.version.id, dataset_id);

        let second = f
            .service
            .commit_version(dataset_id, CommitRequest::default())
            .unwrap();
        assert_ne!(second.version.id, dataset_id);
    }

    #[test]
    fn test_commit_unknown_dataset_is_not_found() {
        let f = fixture();
        let result = f
            .service
            .commit_version(Uuid::new_v4(), CommitRequest::default());
        assert!(matches!(result, Err(VersioningError::DatasetNotFound(_))));
    }

    #[test]
    fn test_commit_with_taken_tag_persists_nothing() {
        let f = fixture();
        let dataset_id = register_dataset(&f);
        f.drafts
            .put_items(dataset_id, vec![draft_item(dataset_id, "q1")])
            .unwrap();

        let first = f
            .service
            .commit_version(
                dataset_id,
                CommitRequest {
                    tag: Some("release".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let rows_before = f.snapshots.row_count().unwrap();
        let result = f.service.commit_version(
            dataset_id,
            CommitRequest {
                tag: Some("release".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(VersioningError::TagConflict { .. })));

        // No version row, no snapshot rows, latest unmoved.
        assert_eq!(f.meta.version_count(dataset_id).unwrap(), 1);
        assert_eq!(f.snapshots.row_count().unwrap(), rows_before);
        let latest = f.meta.tag(dataset_id, LATEST_TAG).unwrap().unwrap();
        assert_eq!(latest.version_id, first.version.id);
    }

    #[test]
    fn test_commit_with_latest_tag_is_redundant_success() {
        let f = fixture();
        let dataset_id = register_dataset(&f);
        f.drafts
            .put_items(dataset_id, vec![draft_item(dataset_id, "q1")])
            .unwrap();

        let view = f
            .service
            .commit_version(
                dataset_id,
                CommitRequest {
                    tag: Some(LATEST_TAG.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(view.tags, vec![LATEST_TAG.to_string()]);
    }

    #[test]
    fn test_commit_counters_are_zero_at_commit_time() {
        let f = fixture();
        let dataset_id = register_dataset(&f);
        f.drafts
            .put_items(
                dataset_id,
                vec![
                    draft_item(dataset_id, "q1"),
                    draft_item(dataset_id, "q2"),
                    draft_item(dataset_id, "q3"),
                ],
            )
            .unwrap();

        let view = f
            .service
            .commit_version(dataset_id, CommitRequest::default())
            .unwrap();
        assert_eq!(view.version.items_count, 0);
        assert_eq!(view.version.items_added, 0);
    }

    #[test]
    fn test_oversized_description_rejected() {
        let f = fixture();
        let dataset_id = register_dataset(&f);

        let result = f.service.commit_version(
            dataset_id,
            CommitRequest {
                change_description: Some("x".repeat(MAX_CHANGE_DESCRIPTION_LEN + 1)),
                ..Default::default()
            },
        );
        match result {
            Err(VersioningError::Validation(violations)) => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].contains("1000"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|v| v.tags)),
        }
    }

    #[test]
    fn test_blank_tag_rejected() {
        let f = fixture();
        let dataset_id = register_dataset(&f);
        let result = f.service.commit_version(
            dataset_id,
            CommitRequest {
                tag: Some("   ".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(VersioningError::Validation(_))));
    }

    #[test]
    fn test_unchanged_items_keep_row_ids_across_versions() {
        let f = fixture();
        let dataset_id = register_dataset(&f);
        let stable = draft_item(dataset_id, "stable");
        let mut evolving = draft_item(dataset_id, "before");

        f.drafts
            .put_items(dataset_id, vec![stable.clone(), evolving.clone()])
            .unwrap();
        let v1 = f
            .service
            .commit_version(dataset_id, CommitRequest::default())
            .unwrap();

        evolving.data = serde_json::json!({"input": "after"});
        f.drafts
            .put_items(dataset_id, vec![stable.clone(), evolving.clone()])
            .unwrap();
        let v2 = f
            .service
            .commit_version(dataset_id, CommitRequest::default())
            .unwrap();

        let v1_rows = f.snapshots.rows_for_version(v1.version.id).unwrap();
        let v2_rows = f.snapshots.rows_for_version(v2.version.id).unwrap();

        let v1_stable = v1_rows.iter().find(|r| r.dataset_item_id == stable.id).unwrap();
        let v2_stable = v2_rows.iter().find(|r| r.dataset_item_id == stable.id).unwrap();
        assert_eq!(v1_stable.id, v2_stable.id);

        let v1_evolving = v1_rows.iter().find(|r| r.dataset_item_id == evolving.id).unwrap();
        let v2_evolving = v2_rows.iter().find(|r| r.dataset_item_id == evolving.id).unwrap();
        assert_ne!(v1_evolving.id, v2_evolving.id);
    }

    #[test]
    fn test_version_delta_derived_from_digests() {
        let f = fixture();
        let dataset_id = register_dataset(&f);
        let kept = draft_item(dataset_id, "kept");
        let removed = draft_item(dataset_id, "removed");

        f.drafts
            .put_items(dataset_id, vec![kept.clone(), removed])
            .unwrap();
        let v1 = f
            .service
            .commit_version(dataset_id, CommitRequest::default())
            .unwrap();

        let added = draft_item(dataset_id, "added");
        f.drafts.put_items(dataset_id, vec![kept, added]).unwrap();
        let v2 = f
            .service
            .commit_version(dataset_id, CommitRequest::default())
            .unwrap();

        let delta = f
            .service
            .version_delta(dataset_id, &v2.version.version_hash)
            .unwrap();
        assert_eq!(delta.items_count, 2);
        assert_eq!(delta.items_added, 1);
        assert_eq!(delta.items_deleted, 1);
        assert_eq!(delta.items_modified, 0);

        let first = f
            .service
            .version_delta(dataset_id, &v1.version.version_hash)
            .unwrap();
        assert_eq!(first.items_count, 2);
        assert_eq!(first.items_added, 2);
    }
}
