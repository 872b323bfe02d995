// JSON surface over the same workflow the HTML pages use
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::{ApplicationDetails, IdeaWithFounder, User, UserType};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::market::domain::{self, Decision, IdeaDraft, IdeaSearch, Viewer};
use crate::market::repository::{ApplicationFilter, IdeaFilter};
use crate::market::workflow;
use crate::state::AppState;

#[derive(Serialize)]
struct IdeasResponse {
    ideas: Vec<IdeaWithFounder>,
    skills: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApplyRequest {
    note: Option<String>,
}

#[derive(Deserialize)]
struct StatusRequest {
    status: Decision,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(me))
        .route("/api/ideas", get(list_ideas).post(create_idea))
        .route("/api/ideas/{id}/applications", post(apply))
        .route("/api/applications", get(list_applications))
        .route("/api/applications/{id}/status", put(update_status))
        .route("/api/developers/{id}", get(developer))
}

/// Drops the applicant's contact fields unless the application is approved.
fn gate_contact(mut details: ApplicationDetails) -> ApplicationDetails {
    if !domain::discloses_contact(details.application.status) {
        if let Some(developer) = details.developer.as_mut() {
            developer.email = String::new();
            developer.whatsapp_number = None;
            developer.github_username = None;
            developer.linkedin_url = None;
        }
    }
    details
}

async fn me(CurrentUser(viewer): CurrentUser) -> Json<User> {
    Json(viewer.user().clone())
}

async fn list_ideas(
    State(state): State<AppState>,
    _user: CurrentUser,
    RawQuery(query): RawQuery,
) -> AppResult<Json<IdeasResponse>> {
    let search = IdeaSearch::from_query(query.as_deref());
    let ideas = state.market.list_ideas(&IdeaFilter::All).await?;
    let skills = domain::collect_skills(&ideas);
    let ideas = domain::filter_ideas(&ideas, &search)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(IdeasResponse { ideas, skills }))
}

async fn create_idea(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Json(draft): Json<IdeaDraft>,
) -> AppResult<impl IntoResponse> {
    let idea = workflow::post_idea(state.market.as_ref(), &viewer, draft).await?;
    Ok((StatusCode::CREATED, Json(idea)))
}

async fn list_applications(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
) -> AppResult<Json<Vec<ApplicationDetails>>> {
    let applications = match &viewer {
        Viewer::Founder(user) => state
            .market
            .list_applications(&ApplicationFilter::Founder(user.id.clone()))
            .await?
            .into_iter()
            .map(gate_contact)
            .collect(),
        Viewer::Developer(user) => {
            state
                .market
                .list_applications(&ApplicationFilter::Developer(user.id.clone()))
                .await?
        }
    };

    Ok(Json(applications))
}

async fn apply(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(idea_id): Path<String>,
    Json(request): Json<ApplyRequest>,
) -> AppResult<impl IntoResponse> {
    let application =
        workflow::apply_to_idea(state.market.as_ref(), &viewer, &idea_id, request.note).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(application_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> AppResult<impl IntoResponse> {
    let application = workflow::decide_application(
        state.market.as_ref(),
        &viewer,
        &application_id,
        request.status,
    )
    .await?;
    Ok(Json(application))
}

async fn developer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<User>> {
    state
        .market
        .find_user(&id)
        .await?
        .filter(|user| user.user_type == UserType::Developer)
        .map(Json)
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Application, ApplicationStatus, Compensation, StartupIdea};

    fn details(status: ApplicationStatus) -> ApplicationDetails {
        ApplicationDetails {
            application: Application {
                id: "a1".into(),
                idea_id: "i1".into(),
                developer_id: "d1".into(),
                note: None,
                status,
                created_at: "2025-01-05T10:00:00.000Z".into(),
            },
            idea: StartupIdea {
                id: "i1".into(),
                founder_id: "f1".into(),
                title: "Build a CRM".into(),
                description: "d".into(),
                required_skills: vec![],
                compensation: Compensation::Monetary {
                    monetary_compensation: 100.0,
                },
                terms_and_conditions: None,
                has_nda: false,
                created_at: "2025-01-05T10:00:00.000Z".into(),
            },
            developer: Some(User {
                id: "d1".into(),
                email: "jane@example.com".into(),
                full_name: "Jane Doe".into(),
                user_type: UserType::Developer,
                background: None,
                expertise: Some("Postgres".into()),
                github_username: Some("janedoe".into()),
                linkedin_url: None,
                whatsapp_number: Some("+15550100".into()),
                created_at: "2025-01-05T10:00:00.000Z".into(),
            }),
        }
    }

    #[test]
    fn pending_and_rejected_applicants_lose_contact_fields() {
        for status in [ApplicationStatus::Pending, ApplicationStatus::Rejected] {
            let gated = gate_contact(details(status));
            let developer = gated.developer.unwrap();
            assert!(developer.email.is_empty());
            assert_eq!(developer.whatsapp_number, None);
            assert_eq!(developer.github_username, None);
            assert_eq!(developer.expertise.as_deref(), Some("Postgres"));
        }
    }

    #[test]
    fn approved_applicants_keep_contact_fields() {
        let gated = gate_contact(details(ApplicationStatus::Approved));
        let developer = gated.developer.unwrap();
        assert_eq!(developer.email, "jane@example.com");
        assert_eq!(developer.whatsapp_number.as_deref(), Some("+15550100"));
    }
}
