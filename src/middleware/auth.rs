//! Bearer-token authentication middleware.
//!
//! Extracts the `Authorization: Bearer <token>` header, validates the token
//! against the identity provider and injects the caller's identity into the
//! request extensions.  Handlers downstream read it with
//! `Extension<CallerIdentity>` and never re-validate.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::error::ServerError;
use crate::state::AppState;

/// The validated identity of the caller, stable for the whole request.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Uuid);

/// Pull the token out of the `Authorization` header, if well-formed.
fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&req) else {
        return ServerError::Auth(AuthError::MissingHeader).into_response();
    };

    match state.auth.verify(token).await {
        Ok(user_id) => {
            req.extensions_mut().insert(CallerIdentity(user_id));
            next.run(req).await
        }
        Err(e) => ServerError::Auth(e).into_response(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
