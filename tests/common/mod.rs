// Shared harness: a router over a throwaway SQLite file
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use cofound::config::Config;
use cofound::db;
use cofound::state::{AppState, DbPool};

pub struct TestApp {
    _tmp: TempDir,
    pub router: Router,
    pub pool: DbPool,
}

pub fn test_app() -> TestApp {
    let tmp = TempDir::new().expect("temp dir");
    let pool = db::create_pool(&tmp.path().join("test.db")).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let mut config = Config::default();
    config.auth.bcrypt_cost = 4;

    TestApp {
        router: cofound::app(AppState::new(pool.clone(), config)),
        pool,
        _tmp: tmp,
    }
}

pub fn form_body(pairs: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION]
        .to_str()
        .expect("location header")
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        path: &str,
        cookie: Option<&str>,
        pairs: &[(&str, &str)],
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form_body(pairs))).unwrap())
            .await
    }

    pub async fn send_json(
        &self,
        method: &str,
        path: &str,
        cookie: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Signs up through the form and returns the `name=token` cookie pair.
    pub async fn signup(
        &self,
        email: &str,
        full_name: &str,
        user_type: &str,
        whatsapp_number: &str,
    ) -> String {
        let response = self
            .post_form(
                "/signup",
                None,
                &[
                    ("email", email),
                    ("password", "hunter22"),
                    ("full_name", full_name),
                    ("user_type", user_type),
                    ("expertise", "Postgres and Rust"),
                    ("whatsapp_number", whatsapp_number),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response)
    }

    pub async fn founder(&self) -> String {
        self.signup("fiona@example.com", "Fiona Founder", "founder", "")
            .await
    }

    pub async fn developer(&self) -> String {
        self.signup("jane@example.com", "Jane Doe", "developer", "+1 555 0100")
            .await
    }

    /// Posts "Build a CRM" (5% + $2000/mo, Rust and Postgres) as the given founder.
    pub async fn post_crm_idea(&self, founder: &str) {
        let response = self
            .post_form(
                "/dashboard/ideas",
                Some(founder),
                &[
                    ("title", "Build a CRM"),
                    ("description", "Sales tooling for plumbers"),
                    ("required_skills", "Rust, Postgres"),
                    ("compensation_type", "both"),
                    ("equity_percentage", "5"),
                    ("monetary_compensation", "2000"),
                    ("terms_and_conditions", "Four year vesting"),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard?notice=idea_posted");
    }

    pub fn scalar(&self, sql: &str) -> String {
        let conn = self.pool.get().expect("connection");
        conn.query_row(sql, [], |row| row.get(0)).expect("scalar")
    }

    pub fn execute(&self, sql: &str) {
        let conn = self.pool.get().expect("connection");
        conn.execute_batch(sql).expect("execute");
    }

    pub fn count(&self, sql: &str) -> i64 {
        let conn = self.pool.get().expect("connection");
        conn.query_row(sql, [], |row| row.get(0)).expect("count")
    }
}

pub fn session_cookie(response: &Response<Body>) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .expect("set-cookie header")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}
