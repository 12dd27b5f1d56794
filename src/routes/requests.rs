//! Model request routes — the gateway's main surface.
//!
//! `POST /api/requests` blocks the calling request for up to the polling
//! budget; a still-pending job is a 200 with an explicit envelope, never an
//! error.  See [`crate::jobs`] for the lifecycle rules.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::auth::CallerIdentity;
use crate::schemas::requests::{CreateRequestBody, SubmitResponse};
use crate::state::AppState;
use crate::store::JobRecord;

#[derive(OpenApi)]
#[openapi(
    paths(create_request, list_requests),
    components(schemas(CreateRequestBody, SubmitResponse, JobRecord))
)]
pub struct RequestsApi;

/// Register model-request routes (mounted under `/api`, auth required).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/requests", get(list_requests).post(create_request))
}

/// Submit an inference job (`POST /api/requests`).
///
/// Creates the job record, dispatches it to the worker and polls for
/// completion.  Returns the terminal record, or a `{message, record}`
/// envelope when the polling budget expires first.
#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "requests",
    request_body = CreateRequestBody,
    responses(
        (status = 200, description = "Terminal record, or still-pending envelope", body = SubmitResponse),
        (status = 400, description = "Missing or empty prompt"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Store or worker failure"),
    ),
    security(("bearer" = []))
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    Json(body): Json<CreateRequestBody>,
) -> Result<Json<SubmitResponse>, ServerError> {
    let outcome = state
        .jobs
        .submit(caller.0, body.model_type, body.input_data)
        .await?;
    Ok(Json(outcome.into()))
}

/// List the caller's jobs (`GET /api/requests`).
#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "requests",
    responses(
        (status = 200, description = "The caller's job records", body = Vec<JobRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Store failure"),
    ),
    security(("bearer" = []))
)]
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<Json<Vec<JobRecord>>, ServerError> {
    let records = state.jobs.list(caller.0).await?;
    Ok(Json(records))
}
