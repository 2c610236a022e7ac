//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{get_video, health, list_captions, ready, request_captions, upload_video};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let video_routes = Router::new()
        .route("/videos/upload", post(upload_video))
        .route("/videos/:video_id", get(get_video))
        .route("/videos/:video_id/captions", post(request_captions))
        .route("/videos/:video_id/captions", get(list_captions));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let max_body = state.config.max_body_size;

    Router::new()
        .nest("/api", video_routes)
        .merge(health_routes)
        // Uploads dominate payload size; both layers must agree
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let parsed = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        layer.allow_origin(parsed)
    }
}
