//! Identity provider client (GoTrue-style REST API).
//!
//! The gateway never validates credentials or tokens itself; everything is
//! delegated to the external provider.  Once [`AuthClient::verify`] succeeds
//! the returned identity is trusted for the rest of the request.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Authentication / authorisation failures.
///
/// The rest of the server does not distinguish sub-kinds beyond
/// "unauthorized"; the variants exist for log detail only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or invalid authorization header")]
    MissingHeader,

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity provider rejected the request (HTTP {status}): {detail}")]
    Provider { status: u16, detail: String },

    #[error("identity provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserResponse {
    id: Uuid,
}

/// REST client for the identity provider.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    /// `base_url` is the platform root; the `/auth/v1` prefix is appended here.
    pub fn new(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_owned(),
        }
    }

    /// Register a new identity.  The provider sends a verification email;
    /// the gateway only reports success or failure.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(format!("{}/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let detail = resp.text().await.unwrap_or_default();
            return Err(AuthError::Provider { status, detail });
        }
        Ok(())
    }

    /// Exchange credentials for an access token.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let resp = self
            .client
            .post(format!("{}/token?grant_type=password", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidCredentials);
        }
        let token: TokenResponse = resp.json().await.map_err(|_| AuthError::InvalidCredentials)?;
        Ok(token.access_token)
    }

    /// Validate a bearer token and return the caller's identity.
    pub async fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let resp = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidToken);
        }
        let user: UserResponse = resp.json().await.map_err(|_| AuthError::InvalidToken)?;
        Ok(user.id)
    }
}
