use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::interviewer::InterviewerError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body that is not JSON or does not match the expected shape.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] InterviewerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Wire shape of every error response: `{"error": ..., "details": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidJson(_) | AppError::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Upstream(_)
            | AppError::Storage(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::InvalidState(msg) => {
                ErrorBody {
                    error: msg.clone(),
                    details: None,
                }
            }
            AppError::InvalidJson(details) => ErrorBody {
                error: "Invalid JSON".to_string(),
                details: Some(details.clone()),
            },
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {e}");
                ErrorBody {
                    error: "An AI processing error occurred".to_string(),
                    details: Some(e.kind().to_string()),
                }
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                ErrorBody {
                    error: "A storage error occurred".to_string(),
                    details: None,
                }
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                ErrorBody {
                    error: "A database error occurred".to_string(),
                    details: None,
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ErrorBody {
                    error: "An internal server error occurred".to_string(),
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidJson(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => {
                AppError::NotFound("Resource not found".to_string())
            }
            other => AppError::Internal(anyhow::anyhow!(other.body_text())),
        }
    }
}
