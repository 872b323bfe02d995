use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::session;
use crate::error::AppError;
use crate::market::Viewer;
use crate::state::AppState;

/// The authenticated user, resolved from the session cookie.
/// Returns 401 if no valid session found.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Viewer);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = {
            let token = cookie_value(parts, &state.config.auth.cookie_name)
                .ok_or(AppError::Unauthorized)?;
            session::session_user_id(&state.db, token)?.ok_or(AppError::Unauthorized)?
        };

        let user = state
            .market
            .find_user(&user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser(Viewer::from(user)))
    }
}

/// Same as [`CurrentUser`] but for HTML pages: no session redirects to `/login`.
#[derive(Debug, Clone)]
pub struct PageUser(pub Viewer);

impl FromRequestParts<AppState> for PageUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(viewer)) => Ok(PageUser(viewer)),
            Err(AppError::Unauthorized) => Err(Redirect::to("/login").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Optional user extractor - returns None instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<Viewer>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(viewer)) => Ok(MaybeUser(Some(viewer))),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}

pub fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}
