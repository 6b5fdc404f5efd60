//! HTTP API route definitions.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{arbitrage, health, metrics, AppState};
use super::rate_limit::rate_limit_middleware;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/arbitrage/:coin", get(arbitrage))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
