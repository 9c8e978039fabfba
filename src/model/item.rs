//! Draft items and their versioned snapshot rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the mutable draft item collection of a dataset.
///
/// Mutation of the draft is out of scope here; drafts are consumed as input
/// through a `DraftItemSource` at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetItem {
    pub id: Uuid,
    pub dataset_id: Uuid,
    /// Item payload (input/expected-output/context of one evaluation item).
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// One snapshot row: item content sealed under a specific version.
///
/// `dataset_item_id` is the logical identity of the item across versions.
/// An unchanged item keeps the same row `id` from one version to the next;
/// a modified item gets a fresh row `id` with the same `dataset_item_id`.
/// Rows are never mutated after their version is sealed, only superseded by
/// the next version's rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshotRecord {
    pub id: Uuid,
    pub dataset_item_id: Uuid,
    pub dataset_id: Uuid,
    pub dataset_version_id: Uuid,
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<Uuid>,
    /// SHA-256 digest of the canonicalized item content. Stored so delta
    /// derivation and unchanged-row detection never re-read payloads.
    pub content_digest: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}
