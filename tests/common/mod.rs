//! Common test utilities and helpers
//!
//! - In-memory database fixture
//! - `TestApp`: the real router over an isolated state
//! - A live server on an ephemeral port for WebSocket tests
//! - Authentication and note helpers

#![allow(dead_code)]

pub mod auth_helpers;
pub mod database;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use std::net::SocketAddr;

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tower::ServiceExt;

use notesync::backend::realtime::{ConnectionId, Frame, OUTBOX_CAPACITY};
use notesync::backend::routes::create_router;
use notesync::backend::server::{build_state, AppState};
use notesync::shared::{AppConfig, AppConfigBuilder};

pub use auth_helpers::TestUser;
pub use database::memory_pool;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router plus the state behind it
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

fn test_config() -> AppConfigBuilder {
    AppConfig::builder()
        .database_url("sqlite::memory:")
        .database_max_connections(1)
        .jwt_secret(TEST_SECRET)
        .bcrypt_cost(4)
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|builder| builder).await
    }

    /// Build with adjusted configuration
    pub async fn with_config<F>(adjust: F) -> Self
    where
        F: FnOnce(AppConfigBuilder) -> AppConfigBuilder,
    {
        let config = adjust(test_config()).build().expect("valid test config");
        let state = build_state(memory_pool().await, config).expect("state");
        let router = create_router(state.clone());
        Self { state, router }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register a socket-less connection in the registry
    pub fn connect(&self) -> (ConnectionId, Receiver<Frame>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        self.state.registry.register(id, tx);
        (id, rx)
    }

    /// Serve the router on an ephemeral local port
    pub async fn serve(&self) -> (SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let router = self.router.clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("server");
        });
        (addr, server)
    }
}

/// Drain every queued frame as JSON
pub fn drain(rx: &mut Receiver<Frame>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(serde_json::from_str(&frame).expect("frame is JSON"));
    }
    frames
}
