//! model-gateway – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Build the shared HTTP client and the four upstream collaborators
//!    (identity provider, record store, worker dispatcher, blob store).
//! 4. Assemble the job lifecycle controller and shared application state.
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

mod auth;
mod blob;
mod config;
mod dispatch;
mod error;
mod jobs;
mod middleware;
mod routes;
mod schemas;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::AuthClient;
use crate::blob::BlobClient;
use crate::config::Config;
use crate::dispatch::edge::EdgeDispatcher;
use crate::jobs::JobController;
use crate::state::AppState;
use crate::store::postgrest::PostgrestStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: GATEWAY_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "model-gateway starting");

    // ── 3. Upstream collaborators ──────────────────────────────────────────────
    // One connection pool shared across all four clients.
    let http = reqwest::Client::builder()
        .user_agent(concat!("model-gateway/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let auth = AuthClient::new(http.clone(), &cfg.upstream_url, &cfg.anon_key);
    let store = PostgrestStore::new(http.clone(), &cfg.upstream_url, &cfg.anon_key);
    let dispatcher = EdgeDispatcher::new(
        http.clone(),
        &cfg.functions_url,
        &cfg.worker_fn,
        &cfg.anon_key,
        cfg.dispatch_timeout,
    );
    let blobs = BlobClient::new(http, &cfg.upstream_url, &cfg.image_bucket, &cfg.anon_key);
    info!(upstream = %cfg.upstream_url, worker = %cfg.worker_fn, "upstream clients ready");

    if cfg.anon_key.is_empty() {
        warn!("GATEWAY_ANON_KEY is empty; upstream services will likely reject requests");
    }

    // ── 4. Controller + shared application state ──────────────────────────────
    let jobs = JobController::new(
        Arc::new(store),
        Arc::new(dispatcher),
        cfg.poll_interval,
        cfg.poll_budget,
    );
    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        auth,
        blobs,
        jobs,
    });

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("model-gateway stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c   => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
