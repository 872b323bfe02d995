use axum::routing::{get, post};
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route(
            "/signup",
            get(handlers::signup_page).post(handlers::signup_submit),
        )
        .route("/logout", post(handlers::logout))
}
