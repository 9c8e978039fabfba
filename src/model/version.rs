//! Dataset and version records.
//!
//! A version is the immutable snapshot of a dataset's draft items at a point
//! in time. Within one dataset, hash equality across commits is a direct
//! function of item-set content, never of time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dataset owning zero or more versions.
///
/// The draft item collection is not part of this record; it is consumed
/// through a `DraftItemSource` at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// One immutable snapshot of a dataset.
///
/// For a dataset's very first version the id equals the dataset id, so both
/// stores can mint the identifier without a coordination round trip.
///
/// Delta counters are persisted as zero at commit time; the derived
/// computation lives in `hasher::delta` and is surfaced on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetVersion {
    pub id: Uuid,
    pub dataset_id: Uuid,
    /// Deterministic digest over the canonicalized item set. Unique only
    /// within a dataset's lineage for practical purposes.
    pub version_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub items_count: u64,
    pub items_added: u64,
    pub items_modified: u64,
    pub items_deleted: u64,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// A version together with its resolved tag list.
///
/// Tags are derived from the tag store, never stored on the version row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersionView {
    #[serde(flatten)]
    pub version: DatasetVersion,
    pub tags: Vec<String>,
}

/// Derived item-level change counters between a version and its predecessor.
///
/// Computed from per-item content digests, not from timestamps. All zero for
/// the very first version of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDelta {
    pub items_count: u64,
    pub items_added: u64,
    pub items_modified: u64,
    pub items_deleted: u64,
}
