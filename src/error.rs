use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Invalid payload: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("missing required settings: {}", .0.join(", "))]
    Config(Vec<&'static str>),

    #[error("{action}: {source}")]
    Storage {
        action: &'static str,
        source: StoreError,
    },
}

impl AppError {
    /// Adapter for `map_err` on write paths: tags a storage failure with the
    /// operation it broke.
    pub fn storage(action: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Storage { action, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string(), None),
            AppError::Validation(detail) => (
                StatusCode::BAD_REQUEST,
                "Invalid payload".to_string(),
                Some(detail),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials".to_string(),
                None,
            ),
            AppError::Config(missing) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server misconfigured".to_string(),
                Some(format!("missing required settings: {}", missing.join(", "))),
            ),
            AppError::Storage { action, source } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                action.to_string(),
                Some(source.to_string()),
            ),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(%message, detail = detail.as_deref(), "request failed");
        }

        let mut body = json!({ "error": message });
        if let Some(detail) = detail {
            body["detail"] = detail.into();
        }

        (status, Json(body)).into_response()
    }
}
