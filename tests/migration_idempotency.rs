//! Backfill migration idempotency tests.
//!
//! Running the backfill twice must produce the same final row counts as
//! running it once; attribution and row identity are preserved from the
//! pre-versioning data, never stamped with migration time.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use snapvault::metastore::MetadataStore;
use snapvault::migration::{run_backfill, BACKFILL_DESCRIPTION, BACKFILL_VERSION_HASH};
use snapvault::model::{Dataset, DatasetItem, LATEST_TAG};
use snapvault::service::{CommitRequest, DatasetVersionService, DraftItemSource, MemoryDraftSource, StaticIdentity};
use snapvault::snapstore::SnapshotStore;
use tempfile::TempDir;
use uuid::Uuid;

// =============================================================================
// Test Utilities
// =============================================================================

fn stores(dir: &TempDir) -> (Arc<MetadataStore>, Arc<SnapshotStore>, Arc<MemoryDraftSource>) {
    (
        Arc::new(MetadataStore::new()),
        Arc::new(SnapshotStore::open(dir.path()).unwrap()),
        Arc::new(MemoryDraftSource::new()),
    )
}

fn legacy_dataset(meta: &Arc<MetadataStore>, name: &str) -> Dataset {
    let dataset = Dataset {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap(),
        created_by: "legacy-owner".to_string(),
    };
    meta.create_dataset(dataset.clone()).unwrap();
    dataset
}

fn legacy_item(dataset_id: Uuid, input: &str) -> DatasetItem {
    DatasetItem {
        id: Uuid::new_v4(),
        dataset_id,
        data: serde_json::json!({"input": input}),
        metadata: BTreeMap::new(),
        source: Some("csv-import".to_string()),
        trace_id: None,
        span_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap(),
        created_by: "legacy-owner".to_string(),
    }
}

// =============================================================================
// Idempotency
// =============================================================================

/// Double-run produces the same final row counts as a single run.
#[test]
fn test_double_run_equals_single_run() {
    let dir = TempDir::new().unwrap();
    let (meta, snapshots, drafts) = stores(&dir);

    for i in 0..3 {
        let dataset = legacy_dataset(&meta, &format!("legacy-{i}"));
        drafts
            .put_items(
                dataset.id,
                vec![
                    legacy_item(dataset.id, "q1"),
                    legacy_item(dataset.id, "q2"),
                ],
            )
            .unwrap();
    }
    let source: Arc<dyn DraftItemSource> = drafts.clone();

    let first = run_backfill(&meta, &snapshots, &source).unwrap();
    assert_eq!(first.datasets_migrated, 3);
    assert_eq!(first.items_copied, 6);

    let rows_after_first = snapshots.row_count().unwrap();
    let second = run_backfill(&meta, &snapshots, &source).unwrap();

    assert_eq!(second.datasets_migrated, 0);
    assert_eq!(second.items_copied, 0);
    assert_eq!(snapshots.row_count().unwrap(), rows_after_first);
    for dataset in meta.datasets().unwrap() {
        assert_eq!(meta.version_count(dataset.id).unwrap(), 1);
    }
}

/// Sentinel version shape: id == dataset id, fixed hash and description,
/// zero counters, original attribution.
#[test]
fn test_sentinel_version_shape() {
    let dir = TempDir::new().unwrap();
    let (meta, snapshots, drafts) = stores(&dir);
    let dataset = legacy_dataset(&meta, "legacy");
    let source: Arc<dyn DraftItemSource> = drafts.clone();

    run_backfill(&meta, &snapshots, &source).unwrap();

    let version = meta.version(dataset.id).unwrap().unwrap();
    assert_eq!(version.id, dataset.id);
    assert_eq!(version.dataset_id, dataset.id);
    assert_eq!(version.version_hash, BACKFILL_VERSION_HASH);
    assert_eq!(version.change_description.as_deref(), Some(BACKFILL_DESCRIPTION));
    assert_eq!(version.items_count, 0);
    assert_eq!(version.created_at, dataset.created_at);
    assert_eq!(version.created_by, dataset.created_by);

    let latest = meta.tag(dataset.id, LATEST_TAG).unwrap().unwrap();
    assert_eq!(latest.version_id, dataset.id);
    assert_eq!(latest.created_by, dataset.created_by);
}

/// Migration survives a snapshot store reopen between runs (resume after
/// restart).
#[test]
fn test_rerun_after_store_reopen() {
    let dir = TempDir::new().unwrap();
    let meta = Arc::new(MetadataStore::new());
    let drafts = Arc::new(MemoryDraftSource::new());
    let dataset = legacy_dataset(&meta, "legacy");
    drafts
        .put_items(dataset.id, vec![legacy_item(dataset.id, "q1")])
        .unwrap();
    let source: Arc<dyn DraftItemSource> = drafts.clone();

    {
        let snapshots = Arc::new(SnapshotStore::open(dir.path()).unwrap());
        run_backfill(&meta, &snapshots, &source).unwrap();
    }

    let reopened = Arc::new(SnapshotStore::open(dir.path()).unwrap());
    let report = run_backfill(&meta, &reopened, &source).unwrap();

    assert_eq!(report.items_copied, 0);
    assert_eq!(reopened.row_count().unwrap(), 1);
}

/// Datasets versioned through normal commits are never touched by backfill.
#[test]
fn test_backfill_ignores_committed_datasets() {
    let dir = TempDir::new().unwrap();
    let (meta, snapshots, drafts) = stores(&dir);
    let dataset = legacy_dataset(&meta, "already-versioned");
    drafts
        .put_items(dataset.id, vec![legacy_item(dataset.id, "q1")])
        .unwrap();

    let service = DatasetVersionService::new(
        meta.clone(),
        snapshots.clone(),
        drafts.clone(),
        Arc::new(StaticIdentity::new("tester", "default")),
    );
    service
        .commit_version(dataset.id, CommitRequest::default())
        .unwrap();
    let rows_before = snapshots.row_count().unwrap();

    let source: Arc<dyn DraftItemSource> = drafts.clone();
    let report = run_backfill(&meta, &snapshots, &source).unwrap();

    assert_eq!(report.datasets_migrated, 0);
    assert_eq!(report.items_copied, 0);
    assert_eq!(snapshots.row_count().unwrap(), rows_before);
}
