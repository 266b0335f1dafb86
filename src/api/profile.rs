//! Profile editing
//!
//! PUT /api/userprofile/edit accepts multipart/form-data with the text
//! fields `username`, `password` and `confirmPassword` plus an optional
//! `profilePicture` file.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    routing::put,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::User;
use crate::services::{PendingUpload, ProfileUpdate};

/// Room for the text fields and multipart framing on top of the file itself
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn router(max_file_size: u64) -> Router<AppState> {
    let limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD);

    Router::new()
        .route("/userprofile/edit", put(edit_profile))
        .layer(DefaultBodyLimit::max(limit))
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::validation_error(err.body_text())
}

/// PUT /api/userprofile/edit
async fn edit_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<User>, ApiError> {
    let mut update = ProfileUpdate::default();
    let mut picture = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "username" => update.username = field.text().await.map_err(multipart_error)?,
            "password" => update.password = field.text().await.map_err(multipart_error)?,
            "confirmPassword" => {
                update.confirm_password = field.text().await.map_err(multipart_error)?
            }
            "profilePicture" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was chosen
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                picture = Some(PendingUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            other => tracing::debug!("Ignoring unexpected profile field {:?}", other),
        }
    }

    let user = state
        .user_service
        .update_profile(&auth.user.id, update, picture)
        .await?;

    Ok(Json(user))
}
