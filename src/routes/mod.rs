//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `GATEWAY_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - Public `/auth` routes
//! - Bearer-protected `/api` routes (model requests, generated images)

mod auth;
mod health;
mod images;
mod requests;

use std::sync::Arc;

use axum::{Router, middleware};
use tower::ServiceBuilder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{auth as auth_mw, cors, trace};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi()]
struct GatewayApi;

fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = GatewayApi::openapi();
    spec.merge(health::HealthApi::openapi());
    spec.merge(auth::AuthApi::openapi());
    spec.merge(requests::RequestsApi::openapi());
    spec.merge(images::ImagesApi::openapi());
    spec
}

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(requests::router())
        .merge(images::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_mw::require_auth,
        ));

    let api_router = Router::new()
        .merge(health::router())
        .merge(auth::router())
        .nest("/api", protected);

    let mut app = Router::new().merge(api_router);

    // ── Swagger UI ────────────────────────────────────────────────────────────
    // Enabled by default; disable with GATEWAY_ENABLE_SWAGGER=false in
    // production to avoid exposing the API structure to potential attackers.
    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
