use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::defaults::default_local_origins;
use crate::server::handlers::{generate, health};
use crate::state::AppState;

/// Creates the application router.
///
/// - `POST /generate`: prompt -> retrieval -> generation
/// - `POST /reset`: clears the conversation session
/// - `GET /health`: liveness plus store/index/session sizes
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route("/generate", post(generate::generate))
        .route("/reset", post(generate::reset))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    let allowed = if allowed.is_empty() {
        default_local_origins()
            .into_iter()
            .filter_map(|origin| HeaderValue::from_str(&origin).ok())
            .collect::<Vec<_>>()
    } else {
        allowed
    };

    layer.allow_origin(AllowOrigin::list(allowed))
}
