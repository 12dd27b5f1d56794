//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! **Security note:** store failures are logged with full detail but only a
//! generic message is returned to the caller so that upstream URLs, SQL, or
//! other implementation details never leak to clients.  Worker rejection
//! detail is deliberately surfaced — it is the caller's job that failed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::blob::BlobError;
use crate::store::StoreError;

/// All errors that can occur in the request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent malformed or missing required input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing, malformed, expired or otherwise invalid credentials.
    #[error("unauthorized: {0}")]
    Auth(#[from] AuthError),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record store was unreachable or rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The external worker rejected the job outright.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),

            // Worker rejections: surface the worker's detail to the caller.
            ServerError::Dispatch(m) => {
                error!(detail = %m, "worker rejected job");
                (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
            }

            // Internal errors: log the full detail, return a generic message.
            ServerError::Store(e) => {
                error!(error = %e, "record store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<BlobError> for ServerError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotFound => ServerError::NotFound("image not found".to_owned()),
            BlobError::Upstream { status, detail } => {
                error!(status, detail = %detail, "blob store error");
                ServerError::Internal("blob store error".to_owned())
            }
            BlobError::Http(e) => {
                error!(error = %e, "blob store unreachable");
                ServerError::Internal("blob store unreachable".to_owned())
            }
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
