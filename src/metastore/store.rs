//! In-memory metadata tables with invariant-enforcing mutation methods.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::{MetaStoreError, MetaStoreResult};
use crate::model::{Dataset, DatasetVersion, VersionTag, LATEST_TAG};

#[derive(Default)]
struct Tables {
    datasets: HashMap<Uuid, Dataset>,
    versions: HashMap<Uuid, DatasetVersion>,
    /// Version ids per dataset, in insert order.
    versions_by_dataset: HashMap<Uuid, Vec<Uuid>>,
    /// Keyed by (dataset_id, tag); the uniqueness constraint.
    tags: HashMap<(Uuid, String), VersionTag>,
}

/// The relational metadata store.
///
/// All mutation methods take `&self`; interior mutability via a single
/// `RwLock` keeps every method atomic with respect to the others.
#[derive(Default)]
pub struct MetadataStore {
    tables: RwLock<Tables>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // datasets
    // ------------------------------------------------------------------

    /// Registers a dataset row. Fails if the id is already taken.
    pub fn create_dataset(&self, dataset: Dataset) -> MetaStoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| MetaStoreError::poisoned())?;
        if tables.datasets.contains_key(&dataset.id) {
            return Err(MetaStoreError::DatasetExists(dataset.id));
        }
        tables.datasets.insert(dataset.id, dataset);
        Ok(())
    }

    pub fn dataset(&self, dataset_id: Uuid) -> MetaStoreResult<Option<Dataset>> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        Ok(tables.datasets.get(&dataset_id).cloned())
    }

    /// All registered datasets. Used by the backfill migration to find
    /// datasets that predate versioning.
    pub fn datasets(&self) -> MetaStoreResult<Vec<Dataset>> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        Ok(tables.datasets.values().cloned().collect())
    }

    // ------------------------------------------------------------------
    // dataset_versions
    // ------------------------------------------------------------------

    /// Appends a version row. Version rows are immutable once inserted;
    /// there is no update or delete path.
    pub fn insert_version(&self, version: DatasetVersion) -> MetaStoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| MetaStoreError::poisoned())?;
        if tables.versions.contains_key(&version.id) {
            return Err(MetaStoreError::VersionExists(version.id));
        }
        tables
            .versions_by_dataset
            .entry(version.dataset_id)
            .or_default()
            .push(version.id);
        tables.versions.insert(version.id, version);
        Ok(())
    }

    pub fn version(&self, version_id: Uuid) -> MetaStoreResult<Option<DatasetVersion>> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        Ok(tables.versions.get(&version_id).cloned())
    }

    /// Resolves a version hash within one dataset's lineage.
    ///
    /// The same content committed twice produces two rows with the same
    /// hash; resolution picks the newest of them.
    pub fn version_by_hash(
        &self,
        dataset_id: Uuid,
        version_hash: &str,
    ) -> MetaStoreResult<Option<DatasetVersion>> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        let mut matches: Vec<&DatasetVersion> = Self::dataset_versions(&tables, dataset_id)
            .into_iter()
            .filter(|v| v.version_hash == version_hash)
            .collect();
        matches.sort_by(newest_first);
        Ok(matches.first().map(|v| (*v).clone()))
    }

    /// The most recent version of a dataset, if any.
    pub fn newest_version(&self, dataset_id: Uuid) -> MetaStoreResult<Option<DatasetVersion>> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        let mut versions = Self::dataset_versions(&tables, dataset_id);
        versions.sort_by(newest_first);
        Ok(versions.first().map(|v| (*v).clone()))
    }

    pub fn version_count(&self, dataset_id: Uuid) -> MetaStoreResult<u64> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        Ok(tables
            .versions_by_dataset
            .get(&dataset_id)
            .map(|ids| ids.len() as u64)
            .unwrap_or(0))
    }

    /// One page of a dataset's versions, newest first (created_at
    /// descending, version id descending as the tie-break). `page` is
    /// 1-indexed. Returns the page slice and the total row count.
    pub fn list_versions(
        &self,
        dataset_id: Uuid,
        page: u64,
        size: u64,
    ) -> MetaStoreResult<(Vec<DatasetVersion>, u64)> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        let mut versions = Self::dataset_versions(&tables, dataset_id);
        versions.sort_by(newest_first);

        let total = versions.len() as u64;
        let offset = page.saturating_sub(1).saturating_mul(size) as usize;
        let slice = versions
            .into_iter()
            .skip(offset)
            .take(size as usize)
            .cloned()
            .collect();
        Ok((slice, total))
    }

    // ------------------------------------------------------------------
    // dataset_version_tags
    // ------------------------------------------------------------------

    /// Atomic insert-if-absent on (dataset_id, tag).
    pub fn insert_tag(&self, tag: VersionTag) -> MetaStoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| MetaStoreError::poisoned())?;
        let key = (tag.dataset_id, tag.tag.clone());
        if tables.tags.contains_key(&key) {
            return Err(MetaStoreError::TagExists { tag: tag.tag });
        }
        tables.tags.insert(key, tag);
        Ok(())
    }

    /// Moves the `latest` tag of a dataset to the given version.
    ///
    /// Upsert semantics: this is the one tag mutation that bypasses the
    /// uniqueness-conflict path. Idempotent for the same target version.
    pub fn move_latest(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        moved_by: &str,
        moved_at: DateTime<Utc>,
    ) -> MetaStoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| MetaStoreError::poisoned())?;
        tables.tags.insert(
            (dataset_id, LATEST_TAG.to_string()),
            VersionTag {
                dataset_id,
                tag: LATEST_TAG.to_string(),
                version_id,
                created_at: moved_at,
                created_by: moved_by.to_string(),
            },
        );
        Ok(())
    }

    pub fn tag(&self, dataset_id: Uuid, tag: &str) -> MetaStoreResult<Option<VersionTag>> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        Ok(tables.tags.get(&(dataset_id, tag.to_string())).cloned())
    }

    /// Removes a tag row. Returns whether a row existed.
    pub fn delete_tag(&self, dataset_id: Uuid, tag: &str) -> MetaStoreResult<bool> {
        let mut tables = self.tables.write().map_err(|_| MetaStoreError::poisoned())?;
        Ok(tables.tags.remove(&(dataset_id, tag.to_string())).is_some())
    }

    /// The tag names pointing at one version: explicit tags in sorted
    /// order, with `latest` last when present.
    pub fn tags_for_version(&self, version_id: Uuid) -> MetaStoreResult<Vec<String>> {
        let tables = self.tables.read().map_err(|_| MetaStoreError::poisoned())?;
        let mut named: Vec<String> = tables
            .tags
            .values()
            .filter(|t| t.version_id == version_id && t.tag != LATEST_TAG)
            .map(|t| t.tag.clone())
            .collect();
        named.sort_unstable();
        let has_latest = tables
            .tags
            .values()
            .any(|t| t.version_id == version_id && t.tag == LATEST_TAG);
        if has_latest {
            named.push(LATEST_TAG.to_string());
        }
        Ok(named)
    }

    fn dataset_versions(tables: &Tables, dataset_id: Uuid) -> Vec<&DatasetVersion> {
        tables
            .versions_by_dataset
            .get(&dataset_id)
            .map(|ids| ids.iter().filter_map(|id| tables.versions.get(id)).collect())
            .unwrap_or_default()
    }
}

fn newest_first(a: &&DatasetVersion, b: &&DatasetVersion) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}
