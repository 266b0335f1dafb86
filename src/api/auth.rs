//! Authentication API endpoints
//!
//! Handles HTTP requests for accounts and sessions:
//! - POST /api/signup - Create an account
//! - POST /api/login - Log in and receive the session cookie
//! - POST /api/logout - Clear and revoke the session
//! - GET /api/dashboard - Current user summary
//! - GET /api/usersession - Session check returning the dashboard redirect
//! - GET /api/userprofile - Current user profile

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{extract_session_token, ApiError, AppState, AuthenticatedUser, JsonBody};
use crate::api::responses::{
    DashboardResponse, MessageResponse, RedirectResponse, UserProfileResponse,
};
use crate::config::AuthConfig;
use crate::services::user::{LoginInput, SignupInput};

/// Request body for signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Routes that need no session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/usersession", get(usersession))
        .route("/userprofile", get(userprofile))
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(config: &AuthConfig, token: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, token, max_age_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(config: &AuthConfig) -> String {
    session_cookie(config, "", 0)
}

fn cookie_header(value: String) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&value).map_err(ApiError::internal)
}

/// POST /api/signup
async fn signup(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_service
        .signup(SignupInput {
            email: body.email,
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/login
///
/// Sets the session cookie and tells the page where to go next.
async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .user_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    let auth = &state.config.auth;
    let cookie = session_cookie(
        auth,
        &outcome.session.token,
        state.user_service.session_ttl().num_seconds(),
    );

    Ok((
        [(header::SET_COOKIE, cookie_header(cookie)?)],
        Json(RedirectResponse {
            redirect: auth.login_redirect.clone(),
        }),
    ))
}

/// POST /api/logout
///
/// Always clears the cookie. A still-valid token is also revoked so a copy
/// of it stops working.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let auth = &state.config.auth;
    let token = extract_session_token(&headers, &auth.cookie_name);

    state.user_service.logout(token.as_deref()).await?;

    Ok((
        [(header::SET_COOKIE, cookie_header(clear_session_cookie(auth))?)],
        Json(MessageResponse::new("Logged out successfully")),
    ))
}

/// GET /api/dashboard
async fn dashboard(auth: AuthenticatedUser) -> Json<DashboardResponse> {
    Json(DashboardResponse::from(&auth.user))
}

/// GET /api/usersession
async fn usersession(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
) -> Json<RedirectResponse> {
    Json(RedirectResponse {
        redirect: state.config.auth.login_redirect.clone(),
    })
}

/// GET /api/userprofile
async fn userprofile(auth: AuthenticatedUser) -> Json<UserProfileResponse> {
    Json(UserProfileResponse::from(&auth.user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let config = AuthConfig::default();
        let cookie = session_cookie(&config, "abc.def", 86400);
        assert_eq!(
            cookie,
            "session=abc.def; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );
    }

    #[test]
    fn test_secure_cookie_and_clear() {
        let config = AuthConfig {
            cookie_secure: true,
            cookie_name: "gallery".to_string(),
            ..AuthConfig::default()
        };
        assert!(session_cookie(&config, "t", 10).ends_with("; Secure"));

        let cleared = clear_session_cookie(&config);
        assert!(cleared.starts_with("gallery=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
