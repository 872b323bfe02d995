use askama::Template;
use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::models::{ApplicationDetails, Compensation, IdeaWithFounder};
use crate::error::{AppError, AppResult};
use crate::extractors::PageUser;
use crate::market::domain::{self, DomainError, IdeaSearch, Viewer};
use crate::market::repository::{ApplicationFilter, IdeaFilter};
use crate::market::workflow;
use crate::routes::home::{Html, Nav, Notice};
use crate::state::AppState;

pub struct SkillChip {
    pub name: String,
    pub selected: bool,
    pub href: String,
}

pub struct IdeaCard {
    pub title: String,
    pub description: String,
    pub founder_name: String,
    pub date: String,
    pub skills: Vec<String>,
    pub compensation: String,
    pub has_nda: bool,
    pub applied: bool,
    pub details_href: String,
}

pub struct IdeaDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub skills: Vec<String>,
    pub compensation_kind: &'static str,
    pub equity: Option<String>,
    pub monthly: Option<String>,
    pub terms: Option<String>,
    pub has_nda: bool,
    pub applied: bool,
    pub close_href: String,
}

#[derive(Template)]
#[template(path = "pages/ideas.html")]
pub struct IdeasTemplate {
    pub nav: Nav,
    pub term: String,
    pub chips: Vec<SkillChip>,
    pub cards: Vec<IdeaCard>,
    pub detail: Option<IdeaDetail>,
    pub is_developer: bool,
    pub notice: Option<Notice>,
}

#[derive(Deserialize)]
pub struct ApplyForm {
    pub note: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ideas", get(ideas_page))
        .route("/ideas/{id}/apply", post(apply))
}

fn compensation_kind(compensation: &Compensation) -> &'static str {
    match compensation {
        Compensation::Equity { .. } => "Equity only",
        Compensation::Monetary { .. } => "Monthly pay",
        Compensation::Both { .. } => "Equity and monthly pay",
    }
}

fn idea_card(entry: &IdeaWithFounder, search: &IdeaSearch, applied: bool) -> IdeaCard {
    let idea = &entry.idea;
    IdeaCard {
        title: idea.title.clone(),
        description: idea.description.clone(),
        founder_name: entry
            .founder
            .as_ref()
            .map(|f| f.full_name.clone())
            .unwrap_or_else(|| "Anonymous".to_string()),
        date: domain::format_date(&idea.created_at),
        skills: idea.required_skills.clone(),
        compensation: idea.compensation.label(),
        has_nda: idea.has_nda,
        applied,
        details_href: format!("/ideas?{}", search.select_query(&idea.id)),
    }
}

fn idea_detail(entry: &IdeaWithFounder, search: &IdeaSearch, applied: bool) -> IdeaDetail {
    let idea = &entry.idea;
    IdeaDetail {
        id: idea.id.clone(),
        title: idea.title.clone(),
        description: idea.description.clone(),
        skills: idea.required_skills.clone(),
        compensation_kind: compensation_kind(&idea.compensation),
        equity: idea
            .compensation
            .equity_percentage()
            .map(|e| format!("{}%", e)),
        monthly: idea
            .compensation
            .monetary_compensation()
            .map(|m| format!("${}", m)),
        terms: idea.terms_and_conditions.clone(),
        has_nda: idea.has_nda,
        applied,
        close_href: format!("/ideas?{}", search.base_query()),
    }
}

/// GET /ideas - search and skill filters over all ideas
async fn ideas_page(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    RawQuery(query): RawQuery,
) -> AppResult<Response> {
    let search = IdeaSearch::from_query(query.as_deref());
    let notice = Notice::from_query(query.as_deref());

    let ideas = match state.market.list_ideas(&IdeaFilter::All).await {
        Ok(ideas) => ideas,
        Err(e) => {
            tracing::error!("Failed to fetch ideas: {}", e);
            Vec::new()
        }
    };

    let own_applications: Vec<ApplicationDetails> = match &viewer {
        Viewer::Developer(user) => state
            .market
            .list_applications(&ApplicationFilter::Developer(user.id.clone()))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to fetch applications for {}: {}", user.id, e);
                Vec::new()
            }),
        Viewer::Founder(_) => Vec::new(),
    };
    let applied = |idea_id: &str| domain::has_applied(&own_applications, idea_id);

    let chips = domain::collect_skills(&ideas)
        .into_iter()
        .map(|name| SkillChip {
            selected: search.is_selected(&name),
            href: format!("/ideas?{}", search.toggle_skill_query(&name)),
            name,
        })
        .collect();

    let filtered = domain::filter_ideas(&ideas, &search);
    let cards = filtered
        .iter()
        .map(|entry| idea_card(entry, &search, applied(&entry.idea.id)))
        .collect();

    let detail = search.selected.as_deref().and_then(|selected| {
        ideas
            .iter()
            .find(|entry| entry.idea.id == selected)
            .map(|entry| idea_detail(entry, &search, applied(&entry.idea.id)))
    });

    Ok(Html(IdeasTemplate {
        nav: Nav::for_viewer(&viewer),
        term: search.term.clone(),
        chips,
        cards,
        detail,
        is_developer: !viewer.is_founder(),
        notice,
    })
    .into_response())
}

/// POST /ideas/{id}/apply - result comes back as a notice on /ideas
async fn apply(
    State(state): State<AppState>,
    PageUser(viewer): PageUser,
    Path(idea_id): Path<String>,
    Form(form): Form<ApplyForm>,
) -> Response {
    let code = match workflow::apply_to_idea(state.market.as_ref(), &viewer, &idea_id, form.note)
        .await
    {
        Ok(_) => "applied",
        Err(AppError::Domain(DomainError::AlreadyApplied)) => "already_applied",
        Err(AppError::Domain(DomainError::NotADeveloper)) => "not_developer",
        Err(e) => {
            tracing::warn!("Apply to idea {} failed: {}", idea_id, e);
            "apply_failed"
        }
    };

    Redirect::to(&format!("/ideas?notice={}", code)).into_response()
}
