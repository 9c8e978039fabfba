//! Dataset Version Service.
//!
//! The only component with business rules. Orchestrates commit, tagging and
//! listing over the two stores:
//!
//! - validation happens before any durable write (tag uniqueness is checked
//!   before the version insert);
//! - snapshot rows are copied before the version row insert, so readers only
//!   ever observe versions whose snapshot is complete;
//! - commit and tag mutations for one dataset are serialized through a
//!   per-dataset lock; different datasets never contend.

mod errors;
mod service;
mod sources;

pub use errors::{VersioningError, VersioningResult};
pub use service::{CommitRequest, DatasetVersionService, MAX_CHANGE_DESCRIPTION_LEN};
pub use sources::{DraftItemSource, IdentityProvider, MemoryDraftSource, StaticIdentity};
