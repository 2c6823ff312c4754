//! Notes API integration tests

mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn test_create_and_get_note() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/notes",
            Some(&owner.token),
            Some(json!({ "title": "Plan", "content": "step 1", "category": "work", "is_public": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let note = &body["note"];
    assert_eq!(note["title"], "Plan");
    assert_eq!(note["user_id"], owner.id);
    assert_eq!(note["category"], "work");
    assert_eq!(note["is_public"], true);

    let id = note["id"].as_i64().unwrap();
    let (status, body) = app
        .request(Method::GET, &format!("/api/notes/{}", id), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"]["content"], "step 1");
    assert_eq!(body["permission"], "admin");
}

#[tokio::test]
async fn test_create_requires_title() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/notes",
            Some(&owner.token),
            Some(json!({ "title": "   ", "content": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");
}

#[tokio::test]
async fn test_notes_require_authentication() {
    let app = TestApp::new().await;
    let (status, _) = app.request(Method::GET, "/api/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_returns_only_owned_notes_with_filters() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let other = app.register("other@example.com").await;

    for (title, category) in [("Groceries", "home"), ("Roadmap", "work"), ("Standup", "work")] {
        let (status, _) = app
            .request(
                Method::POST,
                "/api/notes",
                Some(&owner.token),
                Some(json!({ "title": title, "category": category })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    app.create_note(&other, "Someone else's", "").await;

    let (_, body) = app.request(Method::GET, "/api/notes", Some(&owner.token), None).await;
    let titles: Vec<&str> = body["notes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 3);
    assert!(!titles.contains(&"Someone else's"));

    let (_, body) = app
        .request(Method::GET, "/api/notes?category=work", Some(&owner.token), None)
        .await;
    assert_eq!(body["notes"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .request(Method::GET, "/api/notes?search=road", Some(&owner.token), None)
        .await;
    let notes = body["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["title"], "Roadmap");
}

#[tokio::test]
async fn test_permission_levels_gate_note_operations() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let reader = app.register("reader@example.com").await;
    let writer = app.register("writer@example.com").await;
    let stranger = app.register("stranger@example.com").await;

    let id = app.create_note(&owner, "Shared", "v1").await;
    app.share(&owner, id, &reader, "read").await;
    app.share(&owner, id, &writer, "write").await;
    let path = format!("/api/notes/{}", id);

    let (status, body) = app.request(Method::GET, &path, Some(&reader.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permission"], "read");

    let (status, _) = app.request(Method::GET, &path, Some(&stranger.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::PUT, &path, Some(&reader.token), Some(json!({ "content": "nope" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(Method::PUT, &path, Some(&writer.token), Some(json!({ "content": "v2" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"]["content"], "v2");
    assert_eq!(body["note"]["title"], "Shared");

    let (status, _) = app.request(Method::DELETE, &path, Some(&writer.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::DELETE, &path, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = app.request(Method::GET, &path, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upgraded_collaborator_can_repeat_rejected_edit() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let peer = app.register("peer@example.com").await;
    let id = app.create_note(&owner, "Shared", "v1").await;
    app.share(&owner, id, &peer, "read").await;
    let path = format!("/api/notes/{}", id);
    let edit = json!({ "content": "v2" });

    let (status, _) = app
        .request(Method::PUT, &path, Some(&peer.token), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, before) = app.request(Method::GET, &path, Some(&peer.token), None).await;
    assert_eq!(before["note"]["content"], "v1");

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/collaborators/note/{}/user/{}", id, peer.id),
            Some(&owner.token),
            Some(json!({ "permission": "write" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let (status, after) = app
        .request(Method::PUT, &path, Some(&peer.token), Some(edit))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["note"]["content"], "v2");
    assert_ne!(before["note"]["updated_at"], after["note"]["updated_at"]);
}

#[tokio::test]
async fn test_update_refreshes_timestamp() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let id = app.create_note(&owner, "Draft", "").await;
    let path = format!("/api/notes/{}", id);

    let (_, before) = app.request(Method::GET, &path, Some(&owner.token), None).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, after) = app
        .request(Method::PUT, &path, Some(&owner.token), Some(json!({ "title": "Final" })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["note"]["title"], "Final");
    assert_ne!(before["note"]["updated_at"], after["note"]["updated_at"]);
    assert_eq!(before["note"]["created_at"], after["note"]["created_at"]);
}

#[tokio::test]
async fn test_update_rejects_blank_title() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let id = app.create_note(&owner, "Draft", "").await;

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/notes/{}", id),
            Some(&owner.token),
            Some(json!({ "title": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_note_is_not_found() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    for method in [Method::GET, Method::DELETE] {
        let (status, body) = app
            .request(method, "/api/notes/9999", Some(&owner.token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Note not found");
    }
}
