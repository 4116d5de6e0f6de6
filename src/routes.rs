use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{AppState, auth, handlers};

// Multipart framing and the metadata fields ride alongside the image bytes,
// so the request body cap sits a little above the per-file limit.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Creates the axum router and associates routes with handlers. The
/// mutating routes sit behind the admin credential middleware; listing and
/// image serving are public.
pub fn create_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/api/test", get(handlers::check_auth))
        .route("/api/upload", post(handlers::upload_image))
        .route("/api/reorder", post(handlers::reorder_images))
        .route("/api/images", delete(handlers::delete_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/api/login", post(handlers::login))
        .route("/api/images", get(handlers::list_images))
        .route("/api/images/{key}", get(handlers::get_image))
        .merge(admin)
        // Middleware layers
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + UPLOAD_OVERHEAD_BYTES,
        ))
        .with_state(state)
}

/// Credentialed CORS from the configured allow-list. Never a wildcard:
/// with credentials in play the origin set must be explicit.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
