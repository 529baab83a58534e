//! Error types for the Inkmark server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::dom::MarkupError;
use crate::highlights::{ServiceError, StoreError};
use crate::html::SanitizeError;
use crate::overlay::OverlayError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    #[error("Sanitize error: {0}")]
    Sanitize(#[from] SanitizeError),

    #[error("Highlight {id} was applied but not saved: {source}")]
    NotSaved { id: Uuid, source: StoreError },
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Store(e) => AppError::Store(e),
            ServiceError::Overlay(e) => AppError::Overlay(e),
            ServiceError::NotPersisted { record, source } => AppError::NotSaved {
                id: record.id,
                source,
            },
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Store(e) => match e {
                StoreError::PageNotFound(_)
                | StoreError::HighlightNotFound(_)
                | StoreError::IndexOutOfRange { .. } => {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                }
                StoreError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "invalid_url", e.to_string()),
                StoreError::Database(_) | StoreError::Serialization(_) => {
                    tracing::error!("Store error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage_error",
                        "Storage error".to_string(),
                    )
                }
            },
            AppError::Overlay(e) => match e {
                OverlayError::Anchor(_) => (StatusCode::BAD_REQUEST, "invalid_anchor", e.to_string()),
                OverlayError::Resolve(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "unresolved_anchor",
                    e.to_string(),
                ),
                OverlayError::Decoration(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "decoration_failed",
                    e.to_string(),
                ),
                OverlayError::UnknownHighlight(_) => {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                }
                OverlayError::TargetNotDecorated(_) => {
                    (StatusCode::CONFLICT, "highlight_not_restored", e.to_string())
                }
            },
            AppError::Markup(e) => (StatusCode::BAD_REQUEST, "parse_error", e.to_string()),
            AppError::Sanitize(e) => (StatusCode::BAD_REQUEST, "bad_request", e.to_string()),
            AppError::NotSaved { id, source } => {
                tracing::error!("Highlight {} not saved: {}", id, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    format!("Highlight {} was applied but could not be saved", id),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
