use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::market::Viewer;

/// Navigation bar state shared by every page template.
pub struct Nav {
    pub signed_in: bool,
    pub is_founder: bool,
}

impl Nav {
    pub fn signed_out() -> Self {
        Self {
            signed_in: false,
            is_founder: false,
        }
    }

    pub fn for_viewer(viewer: &Viewer) -> Self {
        Self {
            signed_in: true,
            is_founder: viewer.is_founder(),
        }
    }
}

/// One-shot banner carried across a redirect as `?notice=<code>`.
pub struct Notice {
    pub success: bool,
    pub message: &'static str,
}

impl Notice {
    pub fn from_code(code: &str) -> Option<Self> {
        let (success, message) = match code {
            "applied" => (true, "Application submitted successfully!"),
            "already_applied" => (false, "You have already applied to this idea"),
            "not_developer" => (false, "Only developers can apply to ideas"),
            "apply_failed" => (false, "Failed to submit application"),
            "idea_posted" => (true, "Idea posted successfully!"),
            "profile_saved" => (true, "Profile updated"),
            "already_decided" => (false, "This application has already been decided"),
            _ => return None,
        };
        Some(Self { success, message })
    }

    /// Reads the `notice` key from a raw query string.
    pub fn from_query(query: Option<&str>) -> Option<Self> {
        let query = query?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "notice")
            .and_then(|(_, code)| Self::from_code(&code))
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub async fn index(maybe_user: MaybeUser) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    Ok(Html(HomeTemplate {
        nav: Nav::signed_out(),
    })
    .into_response())
}
