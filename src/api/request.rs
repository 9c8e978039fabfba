//! Request DTOs.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::service::CommitRequest;

/// Body of `POST /v1/datasets/:dataset_id/versions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub change_description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl From<CreateVersionRequest> for CommitRequest {
    fn from(req: CreateVersionRequest) -> Self {
        Self {
            tag: req.tag,
            change_description: req.change_description,
            metadata: req.metadata,
        }
    }
}

/// Body of `POST /v1/datasets/:dataset_id/versions/:hash/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    pub tag: String,
}

/// Query parameters of `GET /v1/datasets/:dataset_id/versions`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_size() -> u64 {
    10
}
