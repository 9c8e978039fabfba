//! Pagination envelope.

use serde::{Deserialize, Serialize};

/// One page of a paged listing.
///
/// Pages are 1-indexed; `total` counts entries across all pages. A listing
/// over an empty collection is an empty page with `total == 0`, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    /// An empty page for the given page/size request.
    pub fn empty(page: u64, size: u64) -> Self {
        Self {
            content: Vec::new(),
            page,
            size,
            total: 0,
        }
    }
}
