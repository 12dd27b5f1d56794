//! Generated-image download route.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_generated_image))]
pub struct ImagesApi;

/// Register image routes (mounted under `/api`, auth required).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/images/{id}", get(get_generated_image))
}

/// Stream a generated image from the blob store (`GET /api/images/{id}`).
#[utoipa::path(
    get,
    path = "/api/images/{id}",
    tag = "images",
    params(("id" = String, Path, description = "Object id in the image bucket")),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Image not found"),
    ),
    security(("bearer" = []))
)]
pub async fn get_generated_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let object = state.blobs.download(&id).await?;
    Ok(([(header::CONTENT_TYPE, object.content_type)], object.bytes).into_response())
}
