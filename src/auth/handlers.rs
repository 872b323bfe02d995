use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{password, session};
use crate::db::models::{NewUser, UserType};
use crate::error::{AppError, AppResult};
use crate::extractors::{cookie_value, MaybeUser};
use crate::market::domain::{non_empty, web_link};
use crate::market::RepositoryError;
use crate::routes::home::{Html, Nav};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub email: String,
    pub full_name: String,
    pub error: Option<String>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub user_type: String,
    pub background: Option<String>,
    pub expertise: Option<String>,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp_number: Option<String>,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours.saturating_mul(3600);
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// 303 to the dashboard carrying a fresh session cookie.
fn start_session(state: &AppState, user_id: &str) -> AppResult<Response> {
    let token = session::create_session(&state.db, user_id, state.config.auth.session_hours)?;
    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/dashboard".to_string()),
            (header::SET_COOKIE, cookie),
        ],
        "",
    )
        .into_response())
}

// -- Login handlers --

/// GET /login
pub async fn login_page(maybe_user: MaybeUser) -> Response {
    if maybe_user.0.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    Html(LoginTemplate {
        nav: Nav::signed_out(),
        email: String::new(),
        error: None,
    })
    .into_response()
}

/// POST /login - verify email + password and start a session
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let email = form.email.trim().to_string();
    let record = state.market.find_login(&email).await?;

    match record {
        Some(record) if password::verify_password(&form.password, &record.password_hash) => {
            tracing::info!("User {} signed in", record.user.id);
            start_session(&state, &record.user.id)
        }
        _ => {
            tracing::info!("Failed sign-in for {}", email);
            Ok((
                StatusCode::UNAUTHORIZED,
                Html(LoginTemplate {
                    nav: Nav::signed_out(),
                    email,
                    error: Some("Invalid email or password".to_string()),
                }),
            )
                .into_response())
        }
    }
}

// -- Sign-up handlers --

/// GET /signup
pub async fn signup_page(maybe_user: MaybeUser) -> Response {
    if maybe_user.0.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    Html(SignupTemplate {
        nav: Nav::signed_out(),
        email: String::new(),
        full_name: String::new(),
        error: None,
    })
    .into_response()
}

fn validate_signup(form: &SignupForm) -> Result<UserType, String> {
    if !form.email.contains('@') {
        return Err("A valid email is required".to_string());
    }
    if form.full_name.trim().is_empty() {
        return Err("Full name is required".to_string());
    }
    if form.password.len() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    form.user_type
        .parse::<UserType>()
        .map_err(|_| "Choose founder or developer".to_string())
}

/// POST /signup - create the account and start a session
pub async fn signup_submit(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let rerender = |form: &SignupForm, error: String| {
        (
            StatusCode::BAD_REQUEST,
            Html(SignupTemplate {
                nav: Nav::signed_out(),
                email: form.email.clone(),
                full_name: form.full_name.clone(),
                error: Some(error),
            }),
        )
            .into_response()
    };

    let user_type = match validate_signup(&form) {
        Ok(user_type) => user_type,
        Err(error) => return Ok(rerender(&form, error)),
    };
    let linkedin_url = match web_link(form.linkedin_url.clone()) {
        Ok(url) => url,
        Err(e) => return Ok(rerender(&form, e.to_string())),
    };

    let password_hash = password::hash_password(&form.password, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let new_user = NewUser {
        email: form.email.trim().to_string(),
        full_name: form.full_name.trim().to_string(),
        user_type,
        password_hash,
        background: non_empty(form.background.clone()),
        expertise: non_empty(form.expertise.clone()),
        github_username: non_empty(form.github_username.clone()),
        linkedin_url,
        whatsapp_number: non_empty(form.whatsapp_number.clone()),
    };

    match state.market.insert_user(&new_user).await {
        Ok(user) => {
            tracing::info!("New {} account {}", user.user_type, user.id);
            start_session(&state, &user.id)
        }
        Err(RepositoryError::Conflict(_)) => Ok(rerender(
            &form,
            "An account with that email already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

// -- Logout handler --

/// POST /logout - delete session and redirect
pub async fn logout(
    State(state): State<AppState>,
    request: axum::http::Request<axum::body::Body>,
) -> AppResult<Response> {
    let (parts, _body) = request.into_parts();
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = cookie_value(&parts, cookie_name) {
        if let Err(e) = session::delete_session(&state.db, token) {
            tracing::warn!("Failed to delete session: {}", e);
        }
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie(cookie_name)),
        ],
        "",
    )
        .into_response())
}
