mod common;

use axum::http::{header, StatusCode};
use common::{body_text, location, session_cookie, test_app};

#[tokio::test]
async fn dashboard_requires_a_session() {
    let app = test_app();

    let response = app.get("/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let founder = app.founder().await;
    let response = app.get("/dashboard", Some(&founder)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Welcome back, Fiona Founder"));
    assert!(body.contains("Post New Idea"));
}

#[tokio::test]
async fn dashboard_survives_a_failed_fetch() {
    let app = test_app();
    let founder = app.founder().await;
    let developer = app.developer().await;
    app.execute("DROP TABLE applications");

    let response = app.get("/dashboard", Some(&founder)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Pending Applications"));
    assert!(!body.contains("Internal server error"));

    let response = app.get("/dashboard", Some(&developer)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Applications Sent"));

    let response = app.get("/applications", Some(&founder)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn home_redirects_signed_in_users() {
    let app = test_app();

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let developer = app.developer().await;
    let response = app.get("/", Some(&developer)).await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn login_checks_the_password() {
    let app = test_app();
    app.founder().await;

    let response = app
        .post_form(
            "/login",
            None,
            &[("email", "fiona@example.com"), ("password", "wrong-one")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Invalid email or password"));

    let response = app
        .post_form(
            "/login",
            None,
            &[("email", "Fiona@Example.com"), ("password", "hunter22")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let cookie = session_cookie(&response);
    let response = app.get("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_signup_is_refused() {
    let app = test_app();
    app.founder().await;

    let response = app
        .post_form(
            "/signup",
            None,
            &[
                ("email", "fiona@example.com"),
                ("password", "hunter22"),
                ("full_name", "Other Fiona"),
                ("user_type", "developer"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response)
        .await
        .contains("An account with that email already exists"));

    let response = app
        .post_form(
            "/signup",
            None,
            &[
                ("email", "Fiona@Example.COM"),
                ("password", "other-secret"),
                ("full_name", "Other Fiona"),
                ("user_type", "developer"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.count("SELECT COUNT(*) FROM users"), 1);

    let response = app
        .post_form(
            "/login",
            None,
            &[("email", "fiona@example.com"), ("password", "hunter22")],
        )
        .await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app();
    let founder = app.founder().await;

    let response = app.post_form("/logout", Some(&founder), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let response = app.get("/dashboard", Some(&founder)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn ideas_show_compensation_and_filter() {
    let app = test_app();
    let founder = app.founder().await;
    let developer = app.developer().await;
    app.post_crm_idea(&founder).await;

    let body = body_text(app.get("/ideas", Some(&developer)).await).await;
    assert!(body.contains("Build a CRM"));
    assert!(body.contains("5% + $2000"));
    assert!(body.contains("Rust"));
    assert!(body.contains("Fiona Founder"));
    assert!(body.contains("View Details"));

    let body = body_text(app.get("/ideas?q=crm&skill=Postgres", Some(&developer)).await).await;
    assert!(body.contains("Build a CRM"));

    let body = body_text(app.get("/ideas?skill=Python", Some(&developer)).await).await;
    assert!(body.contains("No ideas found matching your criteria."));

    let body = body_text(app.get("/ideas?q=blockchain", Some(&developer)).await).await;
    assert!(body.contains("No ideas found matching your criteria."));
}

#[tokio::test]
async fn founders_see_no_apply_control() {
    let app = test_app();
    let founder = app.founder().await;
    app.post_crm_idea(&founder).await;

    let body = body_text(app.get("/ideas", Some(&founder)).await).await;
    assert!(body.contains("Build a CRM"));
    assert!(!body.contains("View Details"));
}

#[tokio::test]
async fn idea_form_errors_rerender_the_dashboard() {
    let app = test_app();
    let founder = app.founder().await;

    let response = app
        .post_form(
            "/dashboard/ideas",
            Some(&founder),
            &[
                ("title", "Half an idea"),
                ("description", "No skills listed"),
                ("required_skills", " , "),
                ("compensation_type", "equity"),
                ("equity_percentage", "5"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_text(response).await;
    assert!(body.contains("At least one required skill is needed"));
    assert!(body.contains("Half an idea"));
    assert_eq!(app.count("SELECT COUNT(*) FROM startup_ideas"), 0);
}

#[tokio::test]
async fn developers_cannot_post_ideas() {
    let app = test_app();
    let developer = app.developer().await;

    let response = app
        .post_form(
            "/dashboard/ideas",
            Some(&developer),
            &[("title", "Sneaky"), ("description", "d"), ("required_skills", "Rust")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn applying_twice_is_refused() {
    let app = test_app();
    let founder = app.founder().await;
    let developer = app.developer().await;
    app.post_crm_idea(&founder).await;
    let idea_id = app.scalar("SELECT id FROM startup_ideas");
    let apply_path = format!("/ideas/{}/apply", idea_id);

    let response = app
        .post_form(&apply_path, Some(&developer), &[("note", "I know Postgres")])
        .await;
    assert_eq!(location(&response), "/ideas?notice=applied");

    let body = body_text(app.get("/ideas?notice=applied", Some(&developer)).await).await;
    assert!(body.contains("Application submitted successfully!"));
    assert!(body.contains("Applied"));

    let response = app.post_form(&apply_path, Some(&developer), &[]).await;
    assert_eq!(location(&response), "/ideas?notice=already_applied");
    assert_eq!(app.count("SELECT COUNT(*) FROM applications"), 1);

    let response = app.post_form(&apply_path, Some(&founder), &[]).await;
    assert_eq!(location(&response), "/ideas?notice=not_developer");
}

#[tokio::test]
async fn rejected_application_never_shows_contact() {
    let app = test_app();
    let founder = app.founder().await;
    let developer = app.developer().await;
    app.post_crm_idea(&founder).await;
    let idea_id = app.scalar("SELECT id FROM startup_ideas");

    app.post_form(
        &format!("/ideas/{}/apply", idea_id),
        Some(&developer),
        &[("note", "I know Postgres")],
    )
    .await;

    let body = body_text(app.get("/applications", Some(&founder)).await).await;
    assert!(body.contains("Developer Applications"));
    assert!(body.contains("Build a CRM"));
    assert!(body.contains("Jane Doe"));
    assert!(body.contains("I know Postgres"));
    assert!(body.contains("Pending"));
    assert!(body.contains("Reject"));
    assert!(!body.contains("jane@example.com"));

    let application_id = app.scalar("SELECT id FROM applications");
    let response = app
        .post_form(
            &format!("/applications/{}/status", application_id),
            Some(&founder),
            &[("status", "rejected")],
        )
        .await;
    assert_eq!(location(&response), "/applications");

    let body = body_text(app.get("/applications", Some(&founder)).await).await;
    assert!(body.contains("Rejected"));
    assert!(!body.contains("Contact Information"));
    assert!(!body.contains("jane@example.com"));
    assert!(!body.contains("wa.me"));
    assert!(!body.contains(">Approve<"));
}

#[tokio::test]
async fn approved_application_shows_contact_and_survives_a_double_click() {
    let app = test_app();
    let founder = app.founder().await;
    let developer = app.developer().await;
    app.post_crm_idea(&founder).await;
    let idea_id = app.scalar("SELECT id FROM startup_ideas");
    app.post_form(&format!("/ideas/{}/apply", idea_id), Some(&developer), &[])
        .await;

    let status_path = format!(
        "/applications/{}/status",
        app.scalar("SELECT id FROM applications")
    );
    for _ in 0..2 {
        let response = app
            .post_form(&status_path, Some(&founder), &[("status", "approved")])
            .await;
        assert_eq!(location(&response), "/applications");
    }
    assert_eq!(app.scalar("SELECT status FROM applications"), "approved");

    let body = body_text(app.get("/applications", Some(&founder)).await).await;
    assert!(body.contains("Contact Information"));
    assert!(body.contains("jane@example.com"));
    assert!(body.contains("wa.me"));
    assert!(body.contains("15550100"));

    // a late reject cannot undo the approval
    let response = app
        .post_form(&status_path, Some(&founder), &[("status", "rejected")])
        .await;
    assert_eq!(location(&response), "/applications?notice=already_decided");
    assert_eq!(app.scalar("SELECT status FROM applications"), "approved");

    let body = body_text(app.get("/applications", Some(&developer)).await).await;
    assert!(body.contains("Your Applications"));
    assert!(body.contains("Approved"));
}

#[tokio::test]
async fn other_founders_cannot_decide() {
    let app = test_app();
    let founder = app.founder().await;
    let developer = app.developer().await;
    let stranger = app
        .signup("sam@example.com", "Sam Stranger", "founder", "")
        .await;
    app.post_crm_idea(&founder).await;
    let idea_id = app.scalar("SELECT id FROM startup_ideas");
    app.post_form(&format!("/ideas/{}/apply", idea_id), Some(&developer), &[])
        .await;

    let status_path = format!(
        "/applications/{}/status",
        app.scalar("SELECT id FROM applications")
    );
    let response = app
        .post_form(&status_path, Some(&stranger), &[("status", "approved")])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.scalar("SELECT status FROM applications"), "pending");
}

#[tokio::test]
async fn developer_details_page() {
    let app = test_app();
    let founder = app.founder().await;
    app.developer().await;
    let developer_id = app.scalar("SELECT id FROM users WHERE user_type = 'developer'");

    let response = app
        .get(&format!("/developer/{}", developer_id), Some(&founder))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Jane Doe"));
    assert!(body.contains("jane@example.com"));

    let response = app.get("/developer/nobody", Some(&founder)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Developer not found"));
}

#[tokio::test]
async fn linkedin_links_must_be_web_urls() {
    let app = test_app();
    let founder = app.founder().await;
    let developer = app.developer().await;

    let response = app
        .post_form(
            "/profile",
            Some(&developer),
            &[("linkedin_url", "javascript:alert(document.cookie)")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        app.count("SELECT COUNT(*) FROM users WHERE linkedin_url IS NOT NULL"),
        0
    );

    let response = app
        .post_form(
            "/signup",
            None,
            &[
                ("email", "mal@example.com"),
                ("password", "hunter22"),
                ("full_name", "Mal Icious"),
                ("user_type", "developer"),
                ("linkedin_url", "javascript:alert(1)"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response)
        .await
        .contains("LinkedIn URL must start with http"));
    assert_eq!(app.count("SELECT COUNT(*) FROM users"), 2);

    let response = app
        .post_form(
            "/profile",
            Some(&developer),
            &[("linkedin_url", "https://linkedin.com/in/janedoe")],
        )
        .await;
    assert_eq!(location(&response), "/profile?notice=profile_saved");

    let developer_id = app.scalar("SELECT id FROM users WHERE user_type = 'developer'");
    let body = body_text(
        app.get(&format!("/developer/{}", developer_id), Some(&founder))
            .await,
    )
    .await;
    assert!(body.contains("linkedin.com"));
    assert!(!body.contains("javascript:"));
}

#[tokio::test]
async fn profile_edit_keeps_role_and_email() {
    let app = test_app();
    let developer = app.developer().await;

    let response = app
        .post_form(
            "/profile",
            Some(&developer),
            &[
                ("expertise", "Distributed systems"),
                ("github_username", "janedoe"),
                ("background", ""),
            ],
        )
        .await;
    assert_eq!(location(&response), "/profile?notice=profile_saved");

    let body = body_text(app.get("/profile", Some(&developer)).await).await;
    assert!(body.contains("Distributed systems"));
    assert!(body.contains("janedoe"));
    assert!(body.contains("Not specified"));
    assert!(body.contains("jane@example.com"));
    assert!(body.contains("Developer"));
    assert_eq!(
        app.scalar("SELECT user_type FROM users WHERE email = 'jane@example.com'"),
        "developer"
    );
}

#[tokio::test]
async fn stylesheet_is_served() {
    let app = test_app();
    let response = app.get("/assets/css/app.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/assets/css/nope.css", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
