//! Artwork API endpoints
//!
//! - GET /api/artworks - List the collection (public)
//! - GET /api/artwork/{id} - One artwork with its comments (session)
//! - POST /api/artwork/{id}/comment - Comment on an artwork (session)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, JsonBody};
use crate::models::Artwork;
use crate::services::ArtworkDetail;

/// Request body for posting a comment
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: String,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/artworks", get(list_artworks))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/artwork/{id}", get(get_artwork))
        .route("/artwork/{id}/comment", post(add_comment))
}

/// GET /api/artworks
async fn list_artworks(State(state): State<AppState>) -> Result<Json<Vec<Artwork>>, ApiError> {
    let artworks = state.artwork_service.list().await?;
    Ok(Json(artworks))
}

/// GET /api/artwork/{id}
async fn get_artwork(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ArtworkDetail>, ApiError> {
    let detail = state.artwork_service.detail(&id).await?;
    Ok(Json(detail))
}

/// POST /api/artwork/{id}/comment
async fn add_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .comment_service
        .add_comment(&auth.user, &id, &body.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
