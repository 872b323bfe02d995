pub mod api;
pub mod applications;
pub mod assets;
pub mod auth;
pub mod dashboard;
pub mod developer;
pub mod home;
pub mod ideas;
pub mod profile;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Every page, form and API route, still waiting for its state.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .merge(assets::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(ideas::router())
        .merge(applications::router())
        .merge(profile::router())
        .merge(developer::router())
        .merge(api::router())
}
