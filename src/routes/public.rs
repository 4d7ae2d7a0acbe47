use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Auth gate: redirects signed-in visitors, renders the landing page otherwise.
        .route("/", get(handlers::entry))
        // GET /health
        // Monitoring and load balancer checks.
        .route("/health", get(handlers::health))
}
