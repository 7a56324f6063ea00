//! HTTP application wiring (Axum router + engine wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `blocking.rs`: runs engine calls off the async workers
//! - `dto.rs`: request/query DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use closingdesk_infra::Engine;

use crate::middleware;

pub mod blocking;
pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router over a shared engine.
pub fn build_app(engine: Arc<Engine>) -> Router {
    // Protected routes: require an acting user.
    let protected = routes::router()
        .layer(Extension(engine))
        .layer(axum::middleware::from_fn(middleware::actor_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
