//! Item Snapshot Store.
//!
//! The columnar side of the versioning core: an append-only, checksum-
//! verified record log holding `dataset_item_versions` rows. Each record is
//! one snapshot row bound to (dataset_version_id, dataset_item_id).
//!
//! # Design
//!
//! - Append-only: rows are never mutated in place, only superseded by the
//!   next version's rows.
//! - Every record carries a CRC32 checksum, verified on every read; a
//!   checksum mismatch is an explicit corruption error, never ignored.
//! - The full log is replayed into an in-memory index at open.
//! - `copy_rows` is chunked and idempotent: rows already present for the
//!   target (version, item) pair are skipped, so an interrupted copy can be
//!   re-run for the same version id without duplicating rows.
//!
//! There is no cross-store transaction with the metadata store; the version
//! row insert over there is the visibility gate for rows written here.

mod errors;
mod log;
mod store;

pub use errors::{SnapshotStoreError, SnapshotStoreResult};
pub use store::SnapshotStore;

/// Rows appended (and fsynced) per batch during a snapshot copy.
pub const COPY_CHUNK_SIZE: usize = 500;
