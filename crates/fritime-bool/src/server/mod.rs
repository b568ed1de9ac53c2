use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::endpoints::{combined, status};
use crate::types::ServiceState;

mod endpoints;
mod types;

/// Builds the CORS layer for the given origins.
///
/// An empty list allows every origin.
pub fn cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().cloned())
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
/// - `cors`: The CORS policy applied to every route.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<ServiceState>, cors: CorsLayer) -> Router {
    let combined_route = post(combined::post_combined).get(combined::post_combined);

    Router::new()
        .route("/bool", combined_route.clone())
        .route("/bool/", combined_route)
        .route("/bool/health", get(status::get_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
