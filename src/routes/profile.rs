use askama::Template;
use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::db::models::{ProfileUpdate, User};
use crate::error::{AppError, AppResult};
use crate::extractors::PageUser;
use crate::market::domain::{non_empty, web_link};
use crate::routes::home::{Html, Nav, Notice};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub user: User,
    pub role_label: &'static str,
    pub notice: Option<Notice>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile_page).post(update_profile))
}

/// GET /profile
async fn profile_page(
    PageUser(viewer): PageUser,
    RawQuery(query): RawQuery,
) -> AppResult<Response> {
    Ok(Html(ProfileTemplate {
        nav: Nav::for_viewer(&viewer),
        role_label: viewer.role_label(),
        user: viewer.user().clone(),
        notice: Notice::from_query(query.as_deref()),
    })
    .into_response())
}

/// POST /profile - edit the optional fields; role and email stay fixed
async fn update_profile(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    Form(form): Form<ProfileUpdate>,
) -> AppResult<Response> {
    let update = ProfileUpdate {
        background: non_empty(form.background),
        expertise: non_empty(form.expertise),
        github_username: non_empty(form.github_username),
        linkedin_url: web_link(form.linkedin_url)
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        whatsapp_number: non_empty(form.whatsapp_number),
    };

    state.market.update_profile(viewer.id(), &update).await?;
    tracing::info!("Profile updated for {}", viewer.id());

    Ok(Redirect::to("/profile?notice=profile_saved").into_response())
}
