use serde_json::Value;

use crate::common::{ADMIN_EMAIL, routes, spawn_app};

#[tokio::test]
async fn login_issues_session_cookie_and_reports_admin_flag() {
    let app = spawn_app().await;
    let client = app.client();

    let response = app.login(&client, ADMIN_EMAIL).await;
    assert_eq!(response.status(), 200);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("Missing session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["admin"], true);
    assert_eq!(body["name"], "Test User");
}

#[tokio::test]
async fn login_outside_domain_is_rejected_without_cookie() {
    let app = spawn_app().await;
    let client = app.client();

    // The stub verifies this assertion as valid; the domain check must still
    // reject it.
    let response = app.login(&client, "intruder@gmail.com").await;
    assert_eq!(response.status(), 403);
    assert!(response.headers().get("set-cookie").is_none());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "DOMAIN_NOT_ALLOWED");

    // No usable session resulted.
    let me = client.get(app.url(routes::ME)).send().await.unwrap();
    assert_eq!(me.status(), 401);
}

#[tokio::test]
async fn login_with_invalid_assertion_is_unauthorized() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .post(app.url(routes::LOGIN))
        .json(&serde_json::json!({ "idToken": "forged-token" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn login_without_token_is_a_validation_error() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .post(app.url(routes::LOGIN))
        .json(&serde_json::json!({ "idToken": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn me_requires_a_session() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client.get(app.url(routes::ME)).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_MISSING");
}

#[tokio::test]
async fn me_returns_profile_for_logged_in_user() {
    let app = spawn_app().await;
    let client = app.client();

    app.login(&client, "bob@students.example.edu").await;

    let response = client.get(app.url(routes::ME)).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "bob@students.example.edu");
    assert_eq!(body["isAdmin"], false);
}

#[tokio::test]
async fn is_admin_distinguishes_admins_from_members() {
    let app = spawn_app().await;

    let admin = app.client();
    app.login(&admin, ADMIN_EMAIL).await;
    let response = admin
        .post(app.url(routes::IS_ADMIN))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["isAdmin"], true);

    let member = app.client();
    app.login(&member, "carol@students.example.edu").await;
    let response = member
        .post(app.url(routes::IS_ADMIN))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["isAdmin"], false);
}
