//! Observability for the versioning core.
//!
//! Structured JSON logs, synchronous, no buffering. One log line is one
//! event; keys are emitted in deterministic order.

mod logger;

pub use logger::{Logger, Severity};
