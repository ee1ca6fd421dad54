//! HTTP gateway (Axum) for the substitution pipeline.

pub mod error;
pub mod handler;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::GatewayError;
pub use state::GatewayState;

/// Builds the application router.
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/categories", get(handler::categories_handler))
        .route("/index", post(handler::reindex_handler))
        .route("/substitute", post(handler::substitute_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
