//! REST surface for the versioning core.
//!
//! Thin by design: request parsing, error mapping and the wire contract
//! live here; every rule lives in the service. No auth or workspace
//! routing — those belong to the surrounding backend.

mod errors;
mod request;
mod server;

pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use request::{CreateTagRequest, CreateVersionRequest, ListQuery};
pub use server::{router, serve, AppState, ServerConfig};
