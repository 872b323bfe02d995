use askama::Template;
use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::models::{ApplicationDetails, ApplicationStatus, User};
use crate::error::{AppError, AppResult};
use crate::extractors::PageUser;
use crate::market::domain::{self, Decision, DomainError, Viewer};
use crate::market::repository::ApplicationFilter;
use crate::market::workflow;
use crate::routes::home::{Html, Nav, Notice};
use crate::state::AppState;

/// Contact fields, only ever built for approved applications.
pub struct ContactCard {
    pub email: String,
    pub whatsapp_number: Option<String>,
    pub whatsapp_link: Option<String>,
}

pub struct ApplicationRow {
    pub id: String,
    pub idea_title: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub is_pending: bool,
    pub is_approved: bool,
    pub applicant_id: String,
    pub applicant_name: Option<String>,
    pub expertise: Option<String>,
    pub note: Option<String>,
    pub contact: Option<ContactCard>,
}

#[derive(Template)]
#[template(path = "pages/applications.html")]
pub struct ApplicationsTemplate {
    pub nav: Nav,
    pub heading: &'static str,
    pub is_founder: bool,
    pub rows: Vec<ApplicationRow>,
    pub notice: Option<Notice>,
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub status: Decision,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(applications_page))
        .route("/applications/{id}/status", post(update_status))
}

fn contact_card(developer: &User) -> ContactCard {
    ContactCard {
        email: developer.email.clone(),
        whatsapp_number: developer.whatsapp_number.clone(),
        whatsapp_link: developer
            .whatsapp_number
            .as_deref()
            .map(domain::whatsapp_link),
    }
}

fn application_row(details: &ApplicationDetails, viewer: &Viewer) -> ApplicationRow {
    let status = details.application.status;
    let developer = details.developer.as_ref();

    // Contact details stay hidden until the founder approves.
    let contact = match viewer {
        Viewer::Founder(_) if domain::discloses_contact(status) => developer.map(contact_card),
        _ => None,
    };

    ApplicationRow {
        id: details.application.id.clone(),
        idea_title: details.idea.title.clone(),
        status: status.as_str(),
        status_label: status.label(),
        is_pending: status == ApplicationStatus::Pending,
        is_approved: status == ApplicationStatus::Approved,
        applicant_id: details.application.developer_id.clone(),
        applicant_name: developer.map(|d| d.full_name.clone()),
        expertise: developer.and_then(|d| d.expertise.clone()),
        note: details.application.note.clone(),
        contact,
    }
}

/// GET /applications - founders see applicants, developers see their own
async fn applications_page(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    RawQuery(query): RawQuery,
) -> AppResult<Response> {
    let (filter, heading) = match &viewer {
        Viewer::Founder(user) => (
            ApplicationFilter::Founder(user.id.clone()),
            "Developer Applications",
        ),
        Viewer::Developer(user) => (
            ApplicationFilter::Developer(user.id.clone()),
            "Your Applications",
        ),
    };

    let applications = match state.market.list_applications(&filter).await {
        Ok(applications) => applications,
        Err(e) => {
            tracing::error!("Failed to fetch applications for {}: {}", viewer.id(), e);
            Vec::new()
        }
    };

    let rows = applications
        .iter()
        .map(|details| application_row(details, &viewer))
        .collect();

    Ok(Html(ApplicationsTemplate {
        nav: Nav::for_viewer(&viewer),
        heading,
        is_founder: viewer.is_founder(),
        rows,
        notice: Notice::from_query(query.as_deref()),
    })
    .into_response())
}

/// POST /applications/{id}/status - approve or reject, then back to the list
async fn update_status(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    Path(application_id): Path<String>,
    Form(form): Form<StatusForm>,
) -> AppResult<Response> {
    match workflow::decide_application(
        state.market.as_ref(),
        &viewer,
        &application_id,
        form.status,
    )
    .await
    {
        Ok(_) => Ok(Redirect::to("/applications").into_response()),
        Err(AppError::Domain(DomainError::InvalidTransition { .. })) => {
            Ok(Redirect::to("/applications?notice=already_decided").into_response())
        }
        Err(e) => Err(e),
    }
}
