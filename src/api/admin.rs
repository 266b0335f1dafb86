//! Admin API endpoints
//!
//! Every route here sits behind `require_auth` and `require_admin`.
//!
//! - GET /api/admin/users - List all accounts
//! - DELETE /api/admin/users/{id} - Delete an account and its comments
//! - DELETE /api/admin/artworks/{id} - Delete an artwork and its comments

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::MessageResponse;
use crate::models::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/artworks/{id}", delete(delete_artwork))
}

/// GET /api/admin/users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}

/// DELETE /api/admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.delete_user(&id).await?;
    tracing::info!("Admin {} deleted user {}", auth.user.id, id);
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// DELETE /api/admin/artworks/{id}
async fn delete_artwork(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.artwork_service.delete(&id).await?;
    tracing::info!("Admin {} deleted artwork {}", auth.user.id, id);
    Ok(Json(MessageResponse::new("Artwork deleted successfully")))
}
