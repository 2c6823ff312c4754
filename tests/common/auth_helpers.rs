//! Authentication test helpers

use axum::http::{Method, StatusCode};
use serde_json::json;

use notesync::shared::UserId;

use super::TestApp;

/// A registered account and its token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub token: String,
}

impl TestApp {
    /// Register `email` through the API
    pub async fn register(&self, email: &str) -> TestUser {
        let password = "password123";
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "email": email, "password": password, "name": email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_i64().expect("user id"),
            email: email.to_string(),
            password: password.to_string(),
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    /// Create a note owned by `owner` and return its id
    pub async fn create_note(&self, owner: &TestUser, title: &str, content: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/notes",
                Some(&owner.token),
                Some(json!({ "title": title, "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create note failed: {}", body);
        body["note"]["id"].as_i64().expect("note id")
    }

    /// Grant `target` the given level on `note_id`, acting as `owner`
    pub async fn share(&self, owner: &TestUser, note_id: i64, target: &TestUser, permission: &str) {
        let (status, body) = self
            .request(
                Method::POST,
                &format!("/api/collaborators/note/{}", note_id),
                Some(&owner.token),
                Some(json!({ "email": target.email, "permission": permission })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "share failed: {}", body);
    }
}
