//! Signup / signin routes.
//!
//! Credential handling is delegated entirely to the identity provider; the
//! gateway only validates request shape before forwarding.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::auth::{MessageResponse, SignInRequest, SignUpRequest, TokenResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(sign_up, sign_in),
    components(schemas(SignUpRequest, SignInRequest, TokenResponse, MessageResponse))
)]
pub struct AuthApi;

/// Register authentication routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
}

/// Create a new identity (`POST /auth/signup`).
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Signup accepted", body = MessageResponse),
        (status = 400, description = "Invalid email/password or provider rejection"),
    )
)]
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<MessageResponse>, ServerError> {
    req.validate()
        .map_err(|e| ServerError::Validation(e.to_string()))?;

    state
        .auth
        .sign_up(&req.email, &req.password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "signup rejected by identity provider");
            ServerError::Validation("signup failed".to_owned())
        })?;

    Ok(Json(MessageResponse {
        message: "Signup successful. Please check your email for verification.".to_owned(),
    }))
}

/// Exchange credentials for a bearer token (`POST /auth/signin`).
#[utoipa::path(
    post,
    path = "/auth/signin",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<TokenResponse>, ServerError> {
    let token = state.auth.sign_in(&req.email, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}
