//! Version tags.
//!
//! A tag is a named pointer `(dataset_id, tag) -> version_id`. The pair is
//! unique per dataset. Tag rows never change; the one exception is the
//! reserved `latest` tag, which is moved by commit and only by commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The reserved tag name that always points at the most recently committed
/// version of its dataset. Auto-assigned on commit, protected from deletion,
/// never created or moved through the tag API.
pub const LATEST_TAG: &str = "latest";

/// A named pointer from a dataset to one of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionTag {
    pub dataset_id: Uuid,
    pub tag: String,
    pub version_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}
