//! Content hashing for dataset versions.
//!
//! The hasher is pure: same logical content always yields the same hash,
//! independent of item ordering and of volatile fields (timestamps,
//! attribution, storage row ids). Versions are deduplicatable by hash
//! equality within one dataset's lineage.

mod canonical;
mod delta;

pub use canonical::canonical_json;
pub use delta::compute_delta;

use sha2::{Digest, Sha256};

use crate::model::DatasetItem;

/// Computes the SHA-256 digest of one item's logical content.
///
/// Content is the canonical serialization of `data`, `metadata` and `source`.
/// Timestamps, attribution, row ids and trace/span links are volatile and
/// excluded: re-importing the same item content must produce the same digest.
pub fn item_digest(item: &DatasetItem) -> String {
    let content = serde_json::json!({
        "data": item.data,
        "metadata": item.metadata,
        "source": item.source,
    });
    let canonical = canonical_json(&content);
    hex_digest(canonical.as_bytes())
}

/// Computes the version hash over an item set.
///
/// Per-item digests are sorted before hashing, so draft ordering (which is
/// not semantically meaningful) never changes the result.
pub fn dataset_hash(item_digests: &[String]) -> String {
    let mut sorted: Vec<&str> = item_digests.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for digest in &sorted {
        hasher.update(digest.as_bytes());
        hasher.update(b"\n");
    }
    hex_encode(&hasher.finalize())
}

/// Convenience: hash a full draft item set in one call.
pub fn hash_items(items: &[DatasetItem]) -> String {
    let digests: Vec<String> = items.iter().map(item_digest).collect();
    dataset_hash(&digests)
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
