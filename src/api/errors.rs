//! REST error mapping.
//!
//! NotFound → 404, Conflict → 409, Validation → 400 (with the structured
//! violation list), storage/internal → 500. Messages stay machine-checkable:
//! `Tag '<tag>' already exists for this dataset`,
//! `Tag 'latest' cannot be deleted`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::service::VersioningError;

/// Result type for REST handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// A versioning error carried across the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub VersioningError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            VersioningError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
            VersioningError::VersionNotFound { .. } => StatusCode::NOT_FOUND,
            VersioningError::TagConflict { .. } => StatusCode::CONFLICT,
            VersioningError::Validation(_) => StatusCode::BAD_REQUEST,
            VersioningError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            VersioningError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VersioningError> for ApiError {
    fn from(e: VersioningError) -> Self {
        Self(e)
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        let violations = match &err.0 {
            VersioningError::Validation(v) => v.clone(),
            _ => Vec::new(),
        };
        Self {
            code: err.status_code().as_u16(),
            message: err.0.to_string(),
            violations,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError(VersioningError::DatasetNotFound(Uuid::new_v4())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(VersioningError::TagConflict {
                tag: "v1".to_string()
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(VersioningError::Validation(vec!["bad".to_string()])).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(VersioningError::Internal("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_message_names_the_tag() {
        let err = ApiError(VersioningError::TagConflict {
            tag: "v1".to_string(),
        });
        let body = ErrorResponse::from(&err);
        assert_eq!(body.message, "Tag 'v1' already exists for this dataset");
    }

    #[test]
    fn test_validation_violations_carried_in_body() {
        let err = ApiError(VersioningError::Validation(vec![
            "Tag must not be blank".to_string(),
            "Page must be >= 1".to_string(),
        ]));
        let body = ErrorResponse::from(&err);
        assert_eq!(body.violations.len(), 2);
    }
}
