use serde_json::Value;

use crate::common::{ADMIN_EMAIL, png_fixture, routes, spawn_app, upload_form};

const UPLOADER: &str = "dave@students.example.edu";

async fn upload_one(app: &crate::common::TestApp, filename: &str, approved: bool) -> String {
    let client = app.client();
    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(upload_form(
            png_fixture(32, 32),
            filename,
            "Moderation",
            "Dave",
            UPLOADER,
            approved,
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body["files"][0]["fileId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn unapproved_listing_is_open_and_newest_first() {
    let app = spawn_app().await;

    let first = upload_one(&app, "older.png", false).await;
    let second = upload_one(&app, "newer.png", false).await;

    // No session at all.
    let client = app.client();
    let response = client.get(app.url(routes::APPROVALS)).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let listing = body.as_array().unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0]["fileId"], second.as_str());
    assert_eq!(listing[1]["fileId"], first.as_str());
}

#[tokio::test]
async fn moderation_requires_an_admin_session() {
    let app = spawn_app().await;
    let id = upload_one(&app, "pending.png", false).await;

    // No session.
    let anonymous = app.client();
    let response = anonymous
        .post(app.url(&routes::approval(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Valid session, not on the allow-list.
    let member = app.client();
    app.login(&member, "eve@students.example.edu").await;
    let response = member
        .post(app.url(&routes::approval(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn approve_then_disapprove_round_trip() {
    let app = spawn_app().await;
    let id = upload_one(&app, "flip.png", false).await;

    let admin = app.client();
    app.login(&admin, ADMIN_EMAIL).await;

    let response = admin
        .post(app.url(&routes::approval(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["photo"]["approval"], true);

    // Now visible through the approved filter.
    let response = admin
        .get(app.url(routes::PHOTOS))
        .query(&[("approved", "true"), ("event", "Moderation")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = admin
        .post(app.url(&routes::disapprove(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["photo"]["approval"], false);
}

#[tokio::test]
async fn moderating_an_unknown_photo_is_not_found() {
    let app = spawn_app().await;

    let admin = app.client();
    app.login(&admin, ADMIN_EMAIL).await;

    let response = admin
        .post(app.url(&routes::approval(
            "0190cb1c-7e3a-7cc3-ba2e-9f4f3f0a41b2",
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn reject_deletes_blob_and_metadata() {
    let app = spawn_app().await;
    let id = upload_one(&app, "reject.png", false).await;

    let admin = app.client();
    app.login(&admin, ADMIN_EMAIL).await;

    let response = admin
        .delete(app.url(&routes::approval(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The blob is gone from disk.
    assert!(!app.blob_path(&id).exists());

    // View now reports not-found.
    let client = app.client();
    let response = client.get(app.url(&routes::view(&id))).send().await.unwrap();
    assert_eq!(response.status(), 404);

    // And so does the unapproved listing: nothing pending remains.
    let response = client.get(app.url(routes::APPROVALS)).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reject_requires_admin() {
    let app = spawn_app().await;
    let id = upload_one(&app, "safe.png", false).await;

    let member = app.client();
    app.login(&member, "frank@students.example.edu").await;

    let response = member
        .delete(app.url(&routes::approval(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Still pending.
    let response = member.get(app.url(routes::APPROVALS)).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
}
