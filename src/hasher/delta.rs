//! Derived change counters between adjacent snapshots.
//!
//! Deltas compare logical item identities and content digests, never
//! timestamps. They are derived on demand and never persisted on the
//! version row, so commit latency does not depend on them.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::{ItemSnapshotRecord, VersionDelta};

/// Computes added/modified/deleted counters for `next` relative to `prev`.
///
/// An item is identified across versions by `dataset_item_id`:
/// - present in `next` only: added
/// - present in `prev` only: deleted
/// - present in both with a different content digest: modified
///
/// For a first version pass an empty `prev`; the counters are then all zero
/// except `items_count`.
pub fn compute_delta(prev: &[ItemSnapshotRecord], next: &[ItemSnapshotRecord]) -> VersionDelta {
    let prev_digests: HashMap<Uuid, &str> = prev
        .iter()
        .map(|r| (r.dataset_item_id, r.content_digest.as_str()))
        .collect();
    let next_digests: HashMap<Uuid, &str> = next
        .iter()
        .map(|r| (r.dataset_item_id, r.content_digest.as_str()))
        .collect();

    let mut added = 0u64;
    let mut modified = 0u64;
    for (item_id, digest) in &next_digests {
        match prev_digests.get(item_id) {
            None => added += 1,
            Some(old) if old != digest => modified += 1,
            Some(_) => {}
        }
    }

    let deleted = prev_digests
        .keys()
        .filter(|item_id| !next_digests.contains_key(*item_id))
        .count() as u64;

    VersionDelta {
        items_count: next_digests.len() as u64,
        items_added: added,
        items_modified: modified,
        items_deleted: deleted,
    }
}
