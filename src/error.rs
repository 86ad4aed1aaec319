use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::queries::QueryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown visualization: {0}")]
    UnknownVisualization(String),

    #[error("Invalid repository selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::BadSelection(detail) => AppError::InvalidSelection(detail),
            other => AppError::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::Io(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::Internal(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::UnknownVisualization(ref id) => (
                StatusCode::NOT_FOUND,
                format!("visualization '{}' not found", id),
            ),
            AppError::InvalidSelection(ref message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::InvalidInterval(ref value) => (
                StatusCode::BAD_REQUEST,
                format!("unrecognized interval '{}'", value),
            ),
        };

        let body = json!({
            "error": error_message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
