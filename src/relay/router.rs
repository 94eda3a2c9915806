//! Router construction.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use super::middleware::log_request;
use super::state::SharedState;
use crate::constants::{ROUTE_HEALTH, ROUTE_REVIEW, ROUTE_TEST_PROVIDER};

/// Build the relay router. Every origin is allowed.
pub fn build_router(state: SharedState, body_limit: usize) -> Router {
    Router::new()
        .route(ROUTE_REVIEW, post(handlers::review))
        .route(ROUTE_HEALTH, get(handlers::health))
        .route(ROUTE_TEST_PROVIDER, get(handlers::test_provider))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
