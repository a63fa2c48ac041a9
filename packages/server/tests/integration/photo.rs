use serde_json::Value;

use crate::common::{png_fixture, routes, spawn_app, upload_form};

const ALICE: &str = "alice@students.example.edu";
const BOB: &str = "bob@students.example.edu";

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let app = spawn_app().await;
    let client = app.client();

    let form = reqwest::multipart::Form::new().text("title", "no files here");
    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_filter_like_scenario() {
    let app = spawn_app().await;
    let client = app.client();

    // Upload one pre-approved photo tagged to an event.
    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(upload_form(
            png_fixture(64, 48),
            "sunset.png",
            "Test",
            "Alice",
            ALICE,
            true,
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filename"], "sunset.png");
    let id = files[0]["fileId"].as_str().unwrap().to_string();

    // It shows up in the approved listing with the right tag and zero likes.
    let response = client
        .get(app.url(routes::PHOTOS))
        .query(&[("approved", "true")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let files = body["files"].as_array().unwrap();
    let record = files
        .iter()
        .find(|f| f["fileId"] == id.as_str())
        .expect("Uploaded photo missing from approved listing");
    assert_eq!(record["event"], "Test");
    assert_eq!(record["likes"], 0);
    assert_eq!(record["approval"], true);

    // First like from A.
    let a = app.client();
    app.login(&a, ALICE).await;
    let response = a.post(app.url(&routes::like(&id))).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likes"], 1);

    // Second like from A conflicts and changes nothing.
    let response = a.post(app.url(&routes::like(&id))).send().await.unwrap();
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ALREADY_LIKED");

    let response = client.get(app.url(&routes::likes(&id))).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likes"], 1);

    // A different identity can still like.
    let b = app.client();
    app.login(&b, BOB).await;
    let response = b.post(app.url(&routes::like(&id))).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likes"], 2);

    // The listing keeps count and liker set in step.
    let response = client
        .get(app.url(routes::PHOTOS))
        .query(&[("approved", "true")])
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let record = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["fileId"] == id.as_str())
        .unwrap();
    assert_eq!(record["likes"], 2);
    assert_eq!(record["likedBy"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn liking_requires_a_session() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(upload_form(
            png_fixture(32, 32),
            "a.png",
            "",
            "Alice",
            ALICE,
            false,
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["files"][0]["fileId"].as_str().unwrap().to_string();

    let response = client.post(app.url(&routes::like(&id))).send().await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn infected_file_aborts_batch_but_keeps_earlier_files() {
    let app = spawn_app().await;
    let client = app.client();

    let clean = reqwest::multipart::Part::bytes(png_fixture(32, 32))
        .file_name("clean.png")
        .mime_str("image/png")
        .unwrap();
    let infected = reqwest::multipart::Part::bytes(b"EICAR test payload".to_vec())
        .file_name("virus.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .part("files", clean)
        .part("files", infected)
        .text("title", "batch")
        .text("uploaderName", "Mallory")
        .text("userEmail", "mallory@students.example.edu")
        .text("event", "")
        .text("approved", "false");

    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INFECTED_FILE");
    assert!(body["message"].as_str().unwrap().contains("virus.png"));

    // The clean file processed before the abort was NOT rolled back.
    let response = client
        .get(app.url(routes::PHOTOS))
        .query(&[("uploader", "Mallory")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["fileName"], "clean.png");
}

#[tokio::test]
async fn stored_blob_matches_recorded_size() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(upload_form(
            png_fixture(1600, 1200),
            "big.png",
            "",
            "Alice",
            ALICE,
            true,
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["files"][0]["fileId"].as_str().unwrap().to_string();

    let response = client
        .get(app.url(routes::PHOTOS))
        .query(&[("approved", "true")])
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let record = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["fileId"] == id.as_str())
        .unwrap();
    let recorded_size = record["fileSize"].as_i64().unwrap();

    let response = client
        .get(app.url(&routes::download(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    let bytes = response.bytes().await.unwrap();
    assert_eq!(bytes.len() as i64, recorded_size);

    // The stored image was re-encoded and downscaled.
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 800);
}

#[tokio::test]
async fn filtering_with_no_matches_is_not_found() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .get(app.url(routes::PHOTOS))
        .query(&[("event", "NoSuchEvent")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn approved_filter_never_returns_unapproved_records() {
    let app = spawn_app().await;
    let client = app.client();

    for (name, approved) in [("yes.png", true), ("no.png", false)] {
        client
            .post(app.url(routes::UPLOAD))
            .multipart(upload_form(
                png_fixture(32, 32),
                name,
                "Mixer",
                "Alice",
                ALICE,
                approved,
            ))
            .send()
            .await
            .unwrap();
    }

    let response = client
        .get(app.url(routes::PHOTOS))
        .query(&[("event", "Mixer"), ("approved", "true")])
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    for record in body["files"].as_array().unwrap() {
        assert_eq!(record["approval"], true);
    }
}

#[tokio::test]
async fn view_streams_inline_with_stored_content_type() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(upload_form(
            png_fixture(32, 32),
            "inline.png",
            "",
            "Alice",
            ALICE,
            true,
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["files"][0]["fileId"].as_str().unwrap().to_string();

    let response = client.get(app.url(&routes::view(&id))).send().await.unwrap();
    assert_eq!(response.status(), 200);
    // The declared (upload-time) content type is echoed back.
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("inline"));
}

#[tokio::test]
async fn view_self_heals_when_blob_is_missing() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(upload_form(
            png_fixture(32, 32),
            "doomed.png",
            "",
            "Alice",
            ALICE,
            true,
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["files"][0]["fileId"].as_str().unwrap().to_string();

    // Destroy the blob out-of-band.
    std::fs::remove_file(app.blob_path(&id)).expect("Failed to delete blob");

    let response = client.get(app.url(&routes::view(&id))).send().await.unwrap();
    assert_eq!(response.status(), 404);

    // The dangling metadata record was removed too.
    let response = client.get(app.url(&routes::likes(&id))).send().await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn download_does_not_self_heal() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .post(app.url(routes::UPLOAD))
        .multipart(upload_form(
            png_fixture(32, 32),
            "keep.png",
            "",
            "Alice",
            ALICE,
            true,
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["files"][0]["fileId"].as_str().unwrap().to_string();

    std::fs::remove_file(app.blob_path(&id)).expect("Failed to delete blob");

    let response = client
        .get(app.url(&routes::download(&id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Metadata survives a failed download.
    let response = client.get(app.url(&routes::likes(&id))).send().await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn malformed_photo_id_is_a_validation_error() {
    let app = spawn_app().await;
    let client = app.client();

    let response = client
        .get(app.url(&routes::view("not-a-uuid")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
