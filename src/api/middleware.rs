//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token verification)
//! - Authorization (admin role gate)
//! - Security response headers
//!
//! and the shared `AppState` / `ApiError` types used by every handler.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{SessionClaims, User, UserRole};
use crate::services::{
    ArtworkService, ArtworkServiceError, CommentService, CommentServiceError, UserService,
    UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub artwork_service: Arc<ArtworkService>,
    pub comment_service: Arc<CommentService>,
}

/// Identity attached to a request by `require_auth`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session: SessionClaims,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// JSON body extractor whose rejections use the API error format (400)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::validation_error(rejection.body_text())),
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Log the cause and hide it from the client
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", err);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg)
            | UserServiceError::ValidationError(msg)
            | UserServiceError::UserExists(msg) => ApiError::validation_error(msg),
            UserServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
            UserServiceError::NotFound(msg) => ApiError::not_found(msg),
            UserServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

impl From<ArtworkServiceError> for ApiError {
    fn from(err: ArtworkServiceError) -> Self {
        match err {
            ArtworkServiceError::NotFound(msg) => ApiError::not_found(msg),
            ArtworkServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ArtworkServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::NotFound(msg) => ApiError::not_found(msg),
            CommentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CommentServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

/// Extract the session token from a `Bearer` header or the named cookie.
///
/// The header wins when both are present.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_str) = cookie_header.to_str() else {
            continue;
        };
        for cookie in cookie_str.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                if name == cookie_name && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
///
/// Verifies the session token and attaches `AuthenticatedUser`; any failure
/// ends the request with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers(), &state.config.auth.cookie_name)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let resolved = state.user_service.resolve_session(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser {
        user: resolved.user,
        session: resolved.claims,
    });
    Ok(next.run(request).await)
}

/// Admin authorization middleware. Must run after `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if auth.user.role != UserRole::Admin {
        tracing::debug!("User {} denied admin route {}", auth.user.id, request.uri());
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("cross-origin-resource-policy", "cross-origin"),
    ("x-dns-prefetch-control", "off"),
    (
        "content-security-policy",
        "default-src 'none'; img-src 'self'; frame-ancestors 'none'",
    ),
];

/// Add security headers to every response that does not already set them
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for &(name, value) in SECURITY_HEADERS {
        let name = HeaderName::from_static(name);
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    response
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer token-123")]);
        assert_eq!(extract_session_token(&map, "session"), Some("token-123".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_named_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; session=abc.def; other=1")]);
        assert_eq!(extract_session_token(&map, "session"), Some("abc.def".to_string()));
        assert_eq!(extract_session_token(&map, "gallery_sid"), None);
    }

    #[test]
    fn test_extract_session_token_ignores_similar_names() {
        let map = headers(&[(header::COOKIE, "xsession=evil; session_old=x")]);
        assert_eq!(extract_session_token(&map, "session"), None);
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer bearer-token"),
            (header::COOKIE, "session=cookie-token"),
        ]);
        assert_eq!(extract_session_token(&map, "session"), Some("bearer-token".to_string()));
    }

    #[test]
    fn test_extract_session_token_none() {
        assert!(extract_session_token(&HeaderMap::new(), "session").is_none());

        let basic = headers(&[(header::AUTHORIZATION, "Basic abc")]);
        assert!(extract_session_token(&basic, "session").is_none());

        let cleared = headers(&[(header::COOKIE, "session=")]);
        assert!(extract_session_token(&cleared, "session").is_none());
    }

    #[test]
    fn test_api_error_status_mapping() {
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::internal("db down").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = ApiError::internal("password column missing");
        assert_eq!(error.code, "INTERNAL_ERROR");
        assert!(!error.message.contains("password"));
    }

    #[test]
    fn test_service_error_mapping() {
        let cases = [
            (UserServiceError::AuthenticationError("a".into()), StatusCode::BAD_REQUEST),
            (UserServiceError::UserExists("a".into()), StatusCode::BAD_REQUEST),
            (UserServiceError::Unauthorized("a".into()), StatusCode::UNAUTHORIZED),
            (UserServiceError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (
                UserServiceError::InternalError(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }

        assert_eq!(
            ApiError::from(ArtworkServiceError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CommentServiceError::ValidationError("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
