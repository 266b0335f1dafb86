//! Shared API response types
//!
//! Field names follow what the gallery's browser pages read, so most of
//! these serialize in camelCase.

use serde::{Deserialize, Serialize};

use crate::models::User;

/// `{ "message": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{ "redirect": ... }`, sent after login and by the session check
#[derive(Debug, Serialize, Deserialize)]
pub struct RedirectResponse {
    pub redirect: String,
}

/// Current user as shown on the dashboard
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    pub profile_picture: Option<String>,
}

impl From<&User> for DashboardResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role.to_string(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// Current user as shown on the profile page
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    pub email: String,
}

impl From<&User> for UserProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role.to_string(),
            email: user.email.clone(),
        }
    }
}
