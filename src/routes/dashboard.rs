use askama::Template;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::models::ApplicationStatus;
use crate::error::{AppError, AppResult};
use crate::extractors::PageUser;
use crate::market::domain::{self, DomainError, IdeaDraft, Viewer};
use crate::market::repository::{ApplicationFilter, IdeaFilter};
use crate::market::workflow;
use crate::routes::home::{Html, Nav, Notice};
use crate::state::AppState;

pub struct Stat {
    pub label: &'static str,
    pub value: usize,
}

pub struct OwnIdea {
    pub title: String,
    pub description: String,
    pub has_nda: bool,
    pub skills: Vec<String>,
    pub compensation: String,
}

/// Raw "Post New Idea" form. Kept as strings so a failed submit re-renders as typed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdeaForm {
    pub title: String,
    pub description: String,
    pub required_skills: String,
    pub compensation_type: String,
    pub equity_percentage: String,
    pub monetary_compensation: String,
    pub terms_and_conditions: String,
    pub has_nda: Option<String>,
}

impl IdeaForm {
    pub fn to_draft(&self) -> Result<IdeaDraft, DomainError> {
        Ok(IdeaDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            required_skills: domain::parse_skills(&self.required_skills),
            compensation_type: self.compensation_type.clone(),
            equity_percentage: domain::parse_amount(&self.equity_percentage, "Equity percentage")?,
            monetary_compensation: domain::parse_amount(
                &self.monetary_compensation,
                "Monthly compensation",
            )?,
            terms_and_conditions: Some(self.terms_and_conditions.clone()),
            has_nda: self.has_nda.is_some(),
        })
    }

    fn compensation_is(&self, kind: &str) -> bool {
        if self.compensation_type.is_empty() {
            kind == "equity"
        } else {
            self.compensation_type == kind
        }
    }
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub full_name: String,
    pub role_label: &'static str,
    pub is_founder: bool,
    pub stats: Vec<Stat>,
    pub ideas: Vec<OwnIdea>,
    pub form: IdeaForm,
    pub error: Option<String>,
    pub notice: Option<Notice>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/ideas", post(post_idea))
}

async fn render_dashboard(
    state: &AppState,
    viewer: &Viewer,
    form: IdeaForm,
    error: Option<String>,
    notice: Option<Notice>,
) -> DashboardTemplate {
    let (stats, ideas) = match viewer {
        Viewer::Founder(user) => {
            let own = state
                .market
                .list_ideas(&IdeaFilter::Founder(user.id.clone()))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to fetch ideas for {}: {}", user.id, e);
                    Vec::new()
                });
            let received = state
                .market
                .list_applications(&ApplicationFilter::Founder(user.id.clone()))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to fetch applications for {}: {}", user.id, e);
                    Vec::new()
                });
            let pending = received
                .iter()
                .filter(|d| d.application.status == ApplicationStatus::Pending)
                .count();

            let stats = vec![
                Stat {
                    label: "Total Ideas",
                    value: own.len(),
                },
                Stat {
                    label: "Pending Applications",
                    value: pending,
                },
            ];
            let ideas = own
                .into_iter()
                .map(|entry| OwnIdea {
                    compensation: entry.idea.compensation.label(),
                    title: entry.idea.title,
                    description: entry.idea.description,
                    has_nda: entry.idea.has_nda,
                    skills: entry.idea.required_skills,
                })
                .collect();
            (stats, ideas)
        }
        Viewer::Developer(user) => {
            let sent = state
                .market
                .list_applications(&ApplicationFilter::Developer(user.id.clone()))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to fetch applications for {}: {}", user.id, e);
                    Vec::new()
                });
            let approved = sent
                .iter()
                .filter(|d| d.application.status == ApplicationStatus::Approved)
                .count();

            let stats = vec![
                Stat {
                    label: "Applications Sent",
                    value: sent.len(),
                },
                Stat {
                    label: "Approved",
                    value: approved,
                },
            ];
            (stats, Vec::new())
        }
    };

    DashboardTemplate {
        nav: Nav::for_viewer(viewer),
        full_name: viewer.user().full_name.clone(),
        role_label: viewer.role_label(),
        is_founder: viewer.is_founder(),
        stats,
        ideas,
        form,
        error,
        notice,
    }
}

/// GET /dashboard
async fn dashboard(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    RawQuery(query): RawQuery,
) -> Response {
    let notice = Notice::from_query(query.as_deref());
    let template = render_dashboard(&state, &viewer, IdeaForm::default(), None, notice).await;
    Html(template).into_response()
}

/// POST /dashboard/ideas - founder posts a new idea
async fn post_idea(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    Form(form): Form<IdeaForm>,
) -> AppResult<Response> {
    if !viewer.is_founder() {
        return Err(DomainError::NotAFounder.into());
    }

    let result = match form.to_draft() {
        Ok(draft) => workflow::post_idea(state.market.as_ref(), &viewer, draft).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/dashboard?notice=idea_posted").into_response()),
        Err(AppError::Domain(DomainError::Validation(message))) => {
            let template = render_dashboard(&state, &viewer, form, Some(message), None).await;
            Ok((StatusCode::BAD_REQUEST, Html(template)).into_response())
        }
        Err(e) => Err(e),
    }
}
