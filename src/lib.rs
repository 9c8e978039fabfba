//! snapvault - a deterministic dataset versioning and snapshot store
//!
//! Snapshots a mutable collection of dataset items into immutable,
//! hash-addressed versions; tags them; serves any historical state.

pub mod api;
pub mod hasher;
pub mod metastore;
pub mod migration;
pub mod model;
pub mod observability;
pub mod service;
pub mod snapstore;
