// Fetch/check/mutate sequences shared by the HTML pages and the JSON API
use crate::db::models::{Application, NewApplication, StartupIdea};
use crate::error::{AppError, AppResult};
use crate::market::domain::{self, Decision, DomainError, IdeaDraft, Transition, Viewer};
use crate::market::repository::{ApplicationFilter, MarketRepository, RepositoryError};

/// Developer applies to an idea.
///
/// The developer's own applications are fetched first and an existing entry
/// for the idea short-circuits before any insert. The UNIQUE constraint on
/// `(idea_id, developer_id)` catches the window between the two.
pub async fn apply_to_idea(
    repo: &dyn MarketRepository,
    viewer: &Viewer,
    idea_id: &str,
    note: Option<String>,
) -> AppResult<Application> {
    let developer = match viewer {
        Viewer::Developer(user) => user,
        Viewer::Founder(_) => return Err(DomainError::NotADeveloper.into()),
    };

    let own = repo
        .list_applications(&ApplicationFilter::Developer(developer.id.clone()))
        .await?;
    domain::ensure_not_applied(&own, idea_id)?;

    if repo.find_idea(idea_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let application = NewApplication {
        idea_id: idea_id.to_string(),
        developer_id: developer.id.clone(),
        note: domain::non_empty(note),
    };

    match repo.insert_application(&application).await {
        Ok(created) => {
            tracing::info!(
                "Developer {} applied to idea {}",
                developer.id,
                created.idea_id
            );
            Ok(created)
        }
        Err(RepositoryError::Conflict(_)) => Err(DomainError::AlreadyApplied.into()),
        Err(e) => Err(e.into()),
    }
}

/// Founder approves or rejects an application to one of their own ideas.
pub async fn decide_application(
    repo: &dyn MarketRepository,
    viewer: &Viewer,
    application_id: &str,
    decision: Decision,
) -> AppResult<Application> {
    let founder = match viewer {
        Viewer::Founder(user) => user,
        Viewer::Developer(_) => return Err(DomainError::NotAFounder.into()),
    };

    let details = repo
        .find_application(application_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if details.idea.founder_id != founder.id {
        return Err(AppError::Forbidden);
    }

    let status = match domain::decide(details.application.status, decision)? {
        Transition::Applied(status) => status,
        Transition::Repeated(status) => {
            // Two clicks raced the refetch; the write below repeats the first one.
            tracing::warn!(
                "Application {} is already {}; repeating the write",
                application_id,
                status
            );
            status
        }
    };

    let updated = repo
        .update_application_status(application_id, status)
        .await?;
    tracing::info!("Application {} marked {}", application_id, updated.status);
    Ok(updated)
}

/// Founder posts a new idea.
pub async fn post_idea(
    repo: &dyn MarketRepository,
    viewer: &Viewer,
    draft: IdeaDraft,
) -> AppResult<StartupIdea> {
    let founder = match viewer {
        Viewer::Founder(user) => user,
        Viewer::Developer(_) => return Err(DomainError::NotAFounder.into()),
    };

    let new_idea = draft.validate(&founder.id)?;
    let idea = repo.insert_idea(&new_idea).await?;
    tracing::info!("Founder {} posted idea {}", founder.id, idea.id);
    Ok(idea)
}
