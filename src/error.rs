use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::market::domain::DomainError;
use crate::market::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn internal(kind: &str, detail: &dyn std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("{}: {}", kind, detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Domain(e) => {
                let status = match e {
                    DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                    DomainError::NotADeveloper | DomainError::NotAFounder => StatusCode::FORBIDDEN,
                    DomainError::AlreadyApplied | DomainError::InvalidTransition { .. } => {
                        StatusCode::CONFLICT
                    }
                };
                (status, e.to_string())
            }
            AppError::Repository(RepositoryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            AppError::Repository(RepositoryError::Conflict(msg)) => {
                (StatusCode::CONFLICT, msg.clone())
            }
            AppError::Repository(e) => internal("Repository error", e),
            AppError::Internal(msg) => internal("Internal error", msg),
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
