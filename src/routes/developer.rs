use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::db::models::{User, UserType};
use crate::error::AppResult;
use crate::extractors::PageUser;
use crate::market::domain;
use crate::routes::home::{Html, Nav};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/developer.html")]
pub struct DeveloperTemplate {
    pub nav: Nav,
    pub developer: Option<User>,
    pub whatsapp_link: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/developer/{id}", get(developer_page))
}

/// GET /developer/{id} - the explicit "View Details" fetch
async fn developer_page(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let developer = state
        .market
        .find_user(&id)
        .await?
        .filter(|user| user.user_type == UserType::Developer);

    let status = if developer.is_some() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    let whatsapp_link = developer
        .as_ref()
        .and_then(|d| d.whatsapp_number.as_deref())
        .map(domain::whatsapp_link);

    Ok((
        status,
        Html(DeveloperTemplate {
            nav: Nav::for_viewer(&viewer),
            developer,
            whatsapp_link,
        }),
    )
        .into_response())
}
