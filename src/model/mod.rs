//! Domain types for the dataset versioning core.
//!
//! All types here are pure data with no behavior beyond construction and
//! access. A `DatasetVersion` is immutable once committed; mutation of
//! history happens only by appending new versions.

mod item;
mod page;
mod tag;
mod version;

pub use item::{DatasetItem, ItemSnapshotRecord};
pub use page::Page;
pub use tag::{VersionTag, LATEST_TAG};
pub use version::{Dataset, DatasetVersion, DatasetVersionView, VersionDelta};
