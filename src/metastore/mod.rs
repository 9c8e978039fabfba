//! Relational-style metadata store.
//!
//! Holds the three metadata tables of the versioning core:
//!
//! - `datasets`              (id, name, created_at, created_by)
//! - `dataset_versions`      (id, dataset_id, version_hash, counts, ...)
//! - `dataset_version_tags`  (dataset_id, tag, version_id, attribution)
//!   with uniqueness on (dataset_id, tag)
//!
//! # Invariants enforced here
//!
//! - Tag insert is atomic insert-if-absent: no window in which two writers
//!   both succeed for the same (dataset_id, tag).
//! - `move_latest` is an upsert and never goes through the conflict path.
//! - Version rows are append-only; there is no update or delete.
//!
//! The item snapshot rows live in the separate `snapstore`; the two stores
//! share no transaction and coordinate by convention (matching ids).

mod errors;
mod store;

pub use errors::{MetaStoreError, MetaStoreResult};
pub use store::MetadataStore;
