// Library exports for Cofound
// Integration tests drive the router through `app`

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod market;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application router with request tracing.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
