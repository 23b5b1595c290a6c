//! HTTP route assembly: REST control plane, the `/ws` upgrade, health, and
//! metrics endpoints, all behind CORS and request tracing.

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::rest::{close_session, create_session, get_session, join_session, kick_member};
use crate::server::CoordinatorServer;

use super::handler::websocket_handler;

/// Build the full application router. `cors_origins` is `"*"` for permissive
/// CORS or a comma-separated allowlist (spec §10.2).
#[must_use]
pub fn create_router(cors_origins: &str) -> Router<CoordinatorServer> {
    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("no valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/ws/multiplayer", get(websocket_handler))
        .route("/api/multiplayer/sessions", post(create_session))
        .route("/api/multiplayer/sessions/:code", get(get_session))
        .route("/api/multiplayer/sessions/:code/join", post(join_session))
        .route("/api/multiplayer/sessions/:code/close", post(close_session))
        .route("/api/multiplayer/sessions/:code/kick", post(kick_member))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_json))
        .route("/metrics/prom", get(metrics_prometheus))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health_check(State(server): State<CoordinatorServer>) -> axum::response::Result<&'static str> {
    if server.health_check() {
        Ok("OK")
    } else {
        Err(axum::http::StatusCode::SERVICE_UNAVAILABLE.into())
    }
}

async fn metrics_json(State(server): State<CoordinatorServer>) -> axum::Json<crate::metrics::MetricsSnapshot> {
    axum::Json(server.metrics.snapshot())
}

async fn metrics_prometheus(State(server): State<CoordinatorServer>) -> String {
    server.metrics.render_prometheus()
}
