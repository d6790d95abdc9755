use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

// --- Shared query parameters ---

#[derive(Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Deserialize)]
pub struct MoveQuery {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameQuery {
    pub path: String,
    pub new_name: String,
}

/// Application-level error type shared by the core operations and the HTTP
/// handlers. Handlers return it directly; `IntoResponse` maps each kind to a
/// status code.
#[derive(Debug)]
pub enum AppError {
    /// Path traversal or malformed input, rejected before any store call.
    InvalidPath(String),
    /// Key or prefix absent in the store.
    NotFound(String),
    /// Client-supplied data inconsistent with its declared shape.
    BadRequest(String),
    /// No trusted identity on the request.
    AccessDenied,
    Io(std::io::Error),
    /// Transport or backend failure in the object store.
    StoreUnavailable(String),
    /// A subset of the keys touched by a recursive operation failed;
    /// completed sub-operations are left in place.
    PartialFailure(Vec<String>),
    Internal(anyhow::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidPath(p) => write!(f, "invalid path: {p}"),
            AppError::NotFound(k) => write!(f, "not found: {k}"),
            AppError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            AppError::AccessDenied => write!(f, "access denied"),
            AppError::Io(e) => write!(f, "i/o error: {e}"),
            AppError::StoreUnavailable(msg) => write!(f, "store unavailable: {msg}"),
            AppError::PartialFailure(keys) => {
                write!(f, "partial failure: {} key(s) failed", keys.len())
            }
            AppError::Internal(e) => write!(f, "internal error: {e}"),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidPath(p) => {
                (StatusCode::BAD_REQUEST, format!("Invalid path: {p}")).into_response()
            }
            AppError::NotFound(k) => {
                (StatusCode::NOT_FOUND, format!("Not found: {k}")).into_response()
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::AccessDenied => {
                (StatusCode::UNAUTHORIZED, "Access denied".to_string()).into_response()
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "I/O error".to_string()).into_response()
            }
            AppError::StoreUnavailable(msg) => {
                tracing::error!("Store unavailable: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable".to_string()).into_response()
            }
            AppError::PartialFailure(keys) => {
                tracing::error!("Partial failure, {} key(s) left behind", keys.len());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "failedKeys": keys })),
                )
                    .into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()).into_response()
            }
        }
    }
}
