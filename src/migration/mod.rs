//! Idempotent bulk backfill for datasets that predate versioning.
//!
//! Two independently re-runnable halves, both detecting "already migrated"
//! from the data itself rather than from a migration run-log:
//!
//! 1. For every dataset without a version row: insert exactly one version
//!    whose id equals the dataset id, hash equal to the fixed sentinel,
//!    zero counters, the dataset's original attribution (never migration
//!    time), and a `latest` tag pointing at it.
//! 2. For every draft item not yet present in the snapshot store under that
//!    sentinel version: copy it across, preserving original content and
//!    attribution, with the snapshot row id equal to the draft row id.
//!
//! The id-equals-dataset-id trick lets both stores agree on the version
//! identifier without a cross-store transaction. Item copy only targets
//! sentinel versions (hash check), so a dataset whose first version came
//! through a normal commit is never touched.

use std::sync::Arc;

use uuid::Uuid;

use crate::hasher;
use crate::metastore::MetadataStore;
use crate::model::{DatasetVersion, ItemSnapshotRecord};
use crate::observability::Logger;
use crate::service::{DraftItemSource, VersioningResult};
use crate::snapstore::SnapshotStore;

/// Sentinel hash marking a backfilled first version.
pub const BACKFILL_VERSION_HASH: &str = "v1";

/// Fixed marker stored as the change description of backfilled versions.
pub const BACKFILL_DESCRIPTION: &str = "Backfilled from pre-versioning dataset";

/// Outcome of one backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Datasets that received their sentinel version in this run.
    pub datasets_migrated: u64,
    /// Draft items copied into the snapshot store in this run.
    pub items_copied: u64,
}

/// Runs the backfill. Safe to re-run: a second invocation finds every
/// dataset and item already present and reports zero work.
pub fn run_backfill(
    meta: &Arc<MetadataStore>,
    snapshots: &Arc<SnapshotStore>,
    drafts: &Arc<dyn DraftItemSource>,
) -> VersioningResult<BackfillReport> {
    let mut report = BackfillReport::default();

    for dataset in meta.datasets()? {
        if meta.version_count(dataset.id)? == 0 {
            meta.insert_version(DatasetVersion {
                id: dataset.id,
                dataset_id: dataset.id,
                version_hash: BACKFILL_VERSION_HASH.to_string(),
                change_description: Some(BACKFILL_DESCRIPTION.to_string()),
                metadata: Default::default(),
                items_count: 0,
                items_added: 0,
                items_modified: 0,
                items_deleted: 0,
                created_at: dataset.created_at,
                created_by: dataset.created_by.clone(),
            })?;
            meta.move_latest(
                dataset.id,
                dataset.id,
                &dataset.created_by,
                dataset.created_at,
            )?;
            report.datasets_migrated += 1;
            Logger::info(
                "backfill_dataset_migrated",
                &[("dataset_id", &dataset.id.to_string())],
            );
        }

        report.items_copied += backfill_items(meta, snapshots, drafts, dataset.id)?;
    }

    Logger::info(
        "backfill_completed",
        &[
            ("datasets_migrated", &report.datasets_migrated.to_string()),
            ("items_copied", &report.items_copied.to_string()),
        ],
    );
    Ok(report)
}

/// Copies draft items into the sentinel version of one dataset.
///
/// Skips datasets whose first version is not the backfill sentinel, and
/// items already present under the sentinel version id.
fn backfill_items(
    meta: &Arc<MetadataStore>,
    snapshots: &Arc<SnapshotStore>,
    drafts: &Arc<dyn DraftItemSource>,
    dataset_id: Uuid,
) -> VersioningResult<u64> {
    let sentinel = match meta.version(dataset_id)? {
        Some(v) if v.dataset_id == dataset_id && v.version_hash == BACKFILL_VERSION_HASH => v,
        _ => return Ok(0),
    };

    let items = drafts.draft_items(dataset_id)?;
    let rows: Vec<ItemSnapshotRecord> = items
        .iter()
        .map(|item| ItemSnapshotRecord {
            // Versioned item identity equals the original draft row id.
            id: item.id,
            dataset_item_id: item.id,
            dataset_id,
            dataset_version_id: sentinel.id,
            data: item.data.clone(),
            metadata: item.metadata.clone(),
            source: item.source.clone(),
            trace_id: item.trace_id,
            span_id: item.span_id,
            content_digest: hasher::item_digest(item),
            created_at: item.created_at,
            created_by: item.created_by.clone(),
        })
        .collect();

    let appended = snapshots.copy_rows(rows)?;
    Ok(appended as u64)
}
