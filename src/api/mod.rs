//! HTTP router for the sync service.
//!
//! Mounts all endpoints under /v1:
//! - /v1/status: Health check
//! - /v1/oauth/start: Redirect to the provider's consent screen
//! - /v1/oauth/callback: Code exchange + token persistence
//! - /v1/process: Run the today-vs-yesterday sync

pub mod routes;

use crate::SharedState;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/v1", routes::v1_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
