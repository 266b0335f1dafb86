//! API layer - HTTP handlers and routing
//!
//! All JSON endpoints live under `/api`:
//! - Account and session endpoints
//! - Artwork listing, detail and comments
//! - Profile editing with picture upload
//! - Admin user and artwork management
//!
//! Uploaded profile pictures are served as static files under the
//! configured public prefix.

pub mod admin;
pub mod artworks;
pub mod auth;
pub mod middleware;
pub mod profile;
pub mod responses;


use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need a session)
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .merge(artworks::protected_router())
        .merge(profile::router(state.config.upload.max_file_size))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(auth::public_router())
        .merge(artworks::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// CORS for the configured browser origins, with cookies allowed
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service(
            &config.upload.public_prefix,
            ServeDir::new(&config.upload.path),
        )
        .layer(axum_middleware::from_fn(middleware::security_headers))
        .layer(cors_layer(&config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
