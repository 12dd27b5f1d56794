//! Shared application state injected into every Axum handler.
//!
//! All collaborators are constructed once in `main` and passed in here;
//! nothing in the server reaches for a global client handle.

use std::sync::Arc;

use crate::auth::AuthClient;
use crate::blob::BlobClient;
use crate::config::Config;
use crate::dispatch::edge::EdgeDispatcher;
use crate::jobs::JobController;
use crate::store::postgrest::PostgrestStore;

/// State shared across all HTTP handlers.
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Identity provider client, used by the auth routes and middleware.
    pub auth: AuthClient,
    /// Blob store client for generated images.
    pub blobs: BlobClient,
    /// The job lifecycle controller (record store + worker dispatcher).
    pub jobs: JobController<PostgrestStore, EdgeDispatcher>,
}
