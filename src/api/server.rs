//! Axum router for the versioning endpoints.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::errors::ApiResult;
use super::request::{CreateTagRequest, CreateVersionRequest, ListQuery};
use crate::metastore::MetadataStore;
use crate::migration;
use crate::model::{DatasetVersionView, Page};
use crate::observability::Logger;
use crate::service::{DatasetVersionService, DraftItemSource, MemoryDraftSource, StaticIdentity};
use crate::snapstore::SnapshotStore;

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root data directory for the snapshot log.
    pub data_dir: PathBuf,
    /// Listen address.
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Reads `SNAPVAULT_DATA_DIR` (default `./data`) and `SNAPVAULT_ADDR`
    /// (default `127.0.0.1:8080`).
    pub fn from_env() -> Result<Self, String> {
        let data_dir = std::env::var("SNAPVAULT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let addr = std::env::var("SNAPVAULT_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid SNAPVAULT_ADDR: {}", e))?;
        Ok(Self { data_dir, addr })
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DatasetVersionService>,
}

/// Builds the router. All storage I/O is local, so handlers call the
/// service directly.
pub fn router(service: Arc<DatasetVersionService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route(
            "/v1/datasets/:dataset_id/versions",
            post(create_version).get(list_versions),
        )
        .route(
            "/v1/datasets/:dataset_id/versions/:hash/tags",
            post(create_tag),
        )
        .route(
            "/v1/datasets/:dataset_id/versions/:hash/tags/:tag",
            delete(delete_tag),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Boots the stores, runs the backfill, and serves the router.
///
/// Single-process deployment: the draft collection lives in memory and
/// attribution is fixed. Multi-tenant identity belongs to the surrounding
/// backend.
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let meta = Arc::new(MetadataStore::new());
    let snapshots = Arc::new(SnapshotStore::open(&config.data_dir)?);
    let drafts: Arc<dyn DraftItemSource> = Arc::new(MemoryDraftSource::new());
    let identity = Arc::new(StaticIdentity::new("admin", "default"));

    let report = migration::run_backfill(&meta, &snapshots, &drafts)?;
    Logger::info(
        "server_started",
        &[
            ("addr", &config.addr.to_string()),
            ("backfilled_datasets", &report.datasets_migrated.to_string()),
        ],
    );

    let service = Arc::new(DatasetVersionService::new(meta, snapshots, drafts, identity));
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn create_version(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
    Json(body): Json<CreateVersionRequest>,
) -> ApiResult<(StatusCode, Json<DatasetVersionView>)> {
    let view = state.service.commit_version(dataset_id, body.into())?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_versions(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<DatasetVersionView>>> {
    let page = state
        .service
        .list_versions(dataset_id, query.page, query.size)?;
    Ok(Json(page))
}

async fn create_tag(
    State(state): State<AppState>,
    Path((dataset_id, hash)): Path<(Uuid, String)>,
    Json(body): Json<CreateTagRequest>,
) -> ApiResult<StatusCode> {
    state
        .service
        .create_version_tag(dataset_id, &hash, &body.tag)?;
    Ok(StatusCode::CREATED)
}

async fn delete_tag(
    State(state): State<AppState>,
    Path((dataset_id, hash, tag)): Path<(Uuid, String, String)>,
) -> ApiResult<StatusCode> {
    state.service.delete_version_tag(dataset_id, &hash, &tag)?;
    Ok(StatusCode::NO_CONTENT)
}
