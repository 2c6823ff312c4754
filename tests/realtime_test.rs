//! Real-time channel integration tests
//!
//! Most frames are fed through `handle_frame`, the same entry point the
//! WebSocket reader loop uses; replies and broadcasts are read from each
//! connection's outbox. The tests at the end drive the real `/ws` endpoint
//! over TCP to cover connection teardown.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::{drain, TestApp, TestUser};
use notesync::backend::realtime::{handle_frame, ConnectionId, Flow};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn send(app: &TestApp, id: ConnectionId, frame: Value) -> Flow {
    handle_frame(&app.state, id, &frame.to_string()).await
}

async fn authenticate(app: &TestApp, id: ConnectionId, user: &TestUser) {
    send(app, id, json!({ "event": "authenticate", "data": user.token })).await;
}

async fn note_content(app: &TestApp, owner: &TestUser, note_id: i64) -> String {
    let (status, body) = app
        .request(Method::GET, &format!("/api/notes/{}", note_id), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    body["note"]["content"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_authenticate_replies_with_principal() {
    let app = TestApp::new().await;
    let user = app.register("ws@example.com").await;
    let (id, mut rx) = app.connect();

    authenticate(&app, id, &user).await;
    assert_eq!(drain(&mut rx), vec![json!({ "event": "authenticated", "data": user.id })]);
    assert_eq!(app.state.registry.identity_of(id), Some(user.id));
}

#[tokio::test]
async fn test_authenticate_accepts_bearer_object() {
    let app = TestApp::new().await;
    let user = app.register("ws@example.com").await;
    let (id, mut rx) = app.connect();

    let token = format!("Bearer {}", user.token);
    send(&app, id, json!({ "event": "authenticate", "data": { "token": token } })).await;
    assert_eq!(drain(&mut rx)[0]["event"], "authenticated");
}

#[tokio::test]
async fn test_bad_token_yields_auth_error() {
    let app = TestApp::new().await;
    let (id, mut rx) = app.connect();

    let flow = send(&app, id, json!({ "event": "authenticate", "data": "garbage" })).await;
    assert_eq!(flow, Flow::Continue);
    assert_eq!(
        drain(&mut rx),
        vec![json!({ "event": "auth-error", "data": "Malformed token" })]
    );
    assert_eq!(app.state.registry.identity_of(id), None);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_refused_on_both_transports() {
    let app = TestApp::new().await;
    let user = app.register("gone@example.com").await;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&app.state.pool)
        .await
        .unwrap();

    let (status, body) = app
        .request(Method::GET, "/api/auth/me", Some(&user.token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User no longer exists");

    let (id, mut rx) = app.connect();
    authenticate(&app, id, &user).await;
    assert_eq!(
        drain(&mut rx),
        vec![json!({ "event": "auth-error", "data": "User no longer exists" })]
    );
    assert_eq!(app.state.registry.identity_of(id), None);
}

#[tokio::test]
async fn test_join_and_leave() {
    let app = TestApp::new().await;
    let (id, mut rx) = app.connect();

    send(&app, id, json!({ "event": "join-note", "data": 5 })).await;
    assert_eq!(drain(&mut rx), vec![json!({ "event": "joined-note", "data": 5 })]);
    assert!(app.state.registry.room_members(5).contains(&id));

    send(&app, id, json!({ "event": "leave-note", "data": "5" })).await;
    assert!(drain(&mut rx).is_empty());
    assert!(app.state.registry.room_members(5).is_empty());
}

#[tokio::test]
async fn test_writer_update_is_persisted_and_broadcast_verbatim() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let writer = app.register("writer@example.com").await;
    let note_id = app.create_note(&owner, "Doc", "v1").await;
    app.share(&owner, note_id, &writer, "write").await;

    let (owner_conn, mut owner_rx) = app.connect();
    let (writer_conn, mut writer_rx) = app.connect();
    let (outsider_conn, mut outsider_rx) = app.connect();
    authenticate(&app, owner_conn, &owner).await;
    authenticate(&app, writer_conn, &writer).await;
    for conn in [owner_conn, writer_conn] {
        send(&app, conn, json!({ "event": "join-note", "data": note_id })).await;
    }
    send(&app, outsider_conn, json!({ "event": "join-note", "data": note_id + 1 })).await;
    drain(&mut owner_rx);
    drain(&mut writer_rx);
    drain(&mut outsider_rx);

    let payload = json!({ "noteId": note_id, "content": "v2", "cursor": 3 });
    send(&app, writer_conn, json!({ "event": "note-update", "data": payload })).await;

    let expected = json!({ "event": "note-updated", "data": payload });
    assert_eq!(drain(&mut owner_rx), vec![expected.clone()]);
    assert_eq!(drain(&mut writer_rx), vec![expected]);
    assert!(drain(&mut outsider_rx).is_empty());
    assert_eq!(note_content(&app, &owner, note_id).await, "v2");
}

#[tokio::test]
async fn test_reader_update_is_silently_dropped() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let reader = app.register("reader@example.com").await;
    let note_id = app.create_note(&owner, "Doc", "v1").await;
    app.share(&owner, note_id, &reader, "read").await;

    let (owner_conn, mut owner_rx) = app.connect();
    let (reader_conn, mut reader_rx) = app.connect();
    authenticate(&app, owner_conn, &owner).await;
    authenticate(&app, reader_conn, &reader).await;
    for conn in [owner_conn, reader_conn] {
        send(&app, conn, json!({ "event": "join-note", "data": note_id })).await;
    }
    drain(&mut owner_rx);
    drain(&mut reader_rx);

    let flow = send(
        &app,
        reader_conn,
        json!({ "event": "note-update", "data": { "noteId": note_id, "content": "hacked" } }),
    )
    .await;

    assert_eq!(flow, Flow::Continue);
    assert!(drain(&mut owner_rx).is_empty());
    assert!(drain(&mut reader_rx).is_empty());
    assert_eq!(note_content(&app, &owner, note_id).await, "v1");
}

#[tokio::test]
async fn test_rejections_are_reported_when_enabled() {
    let app = TestApp::with_config(|builder| builder.notify_rejected_updates(true)).await;
    let owner = app.register("owner@example.com").await;
    let reader = app.register("reader@example.com").await;
    let note_id = app.create_note(&owner, "Doc", "v1").await;
    app.share(&owner, note_id, &reader, "read").await;

    let (anon, mut anon_rx) = app.connect();
    send(
        &app,
        anon,
        json!({ "event": "note-update", "data": { "noteId": note_id, "content": "x" } }),
    )
    .await;
    assert_eq!(
        drain(&mut anon_rx),
        vec![json!({
            "event": "update-rejected",
            "data": { "noteId": note_id, "reason": "unauthenticated" }
        })]
    );

    let (conn, mut rx) = app.connect();
    authenticate(&app, conn, &reader).await;
    drain(&mut rx);
    send(
        &app,
        conn,
        json!({ "event": "note-update", "data": { "noteId": note_id, "content": "x" } }),
    )
    .await;
    assert_eq!(
        drain(&mut rx),
        vec![json!({
            "event": "update-rejected",
            "data": { "noteId": note_id, "reason": "forbidden" }
        })]
    );
}

#[tokio::test]
async fn test_unauthenticated_update_changes_nothing() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let note_id = app.create_note(&owner, "Doc", "v1").await;

    let (watcher, mut watcher_rx) = app.connect();
    send(&app, watcher, json!({ "event": "join-note", "data": note_id })).await;
    drain(&mut watcher_rx);

    let (anon, mut anon_rx) = app.connect();
    send(
        &app,
        anon,
        json!({ "event": "note-update", "data": { "noteId": note_id, "content": "x" } }),
    )
    .await;

    assert!(drain(&mut anon_rx).is_empty());
    assert!(drain(&mut watcher_rx).is_empty());
    assert_eq!(note_content(&app, &owner, note_id).await, "v1");
}

#[tokio::test]
async fn test_http_update_reaches_room() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let note_id = app.create_note(&owner, "Doc", "v1").await;

    let (watcher, mut rx) = app.connect();
    send(&app, watcher, json!({ "event": "join-note", "data": note_id })).await;
    drain(&mut rx);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/notes/{}", note_id),
            Some(&owner.token),
            Some(json!({ "content": "from http" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        drain(&mut rx),
        vec![json!({
            "event": "note-updated",
            "data": { "noteId": note_id, "title": "Doc", "content": "from http" }
        })]
    );
}

#[tokio::test]
async fn test_unparseable_frames_get_error_and_keep_connection() {
    let app = TestApp::new().await;
    let (id, mut rx) = app.connect();

    let flow = handle_frame(&app.state, id, "this is not json").await;
    assert_eq!(flow, Flow::Continue);
    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "error");
    assert!(frames[0]["data"]["message"].is_string());

    send(&app, id, json!({ "event": "dance", "data": 1 })).await;
    assert_eq!(drain(&mut rx)[0]["event"], "error");
    assert_eq!(app.state.registry.connection_count(), 1);
}

#[tokio::test]
async fn test_logout_closes_channel() {
    let app = TestApp::new().await;
    let (id, _rx) = app.connect();
    assert_eq!(send(&app, id, json!({ "event": "logout" })).await, Flow::Close);
}

#[tokio::test]
async fn test_unregister_removes_connection_from_rooms() {
    let app = TestApp::new().await;
    let (id, _rx) = app.connect();
    send(&app, id, json!({ "event": "join-note", "data": 1 })).await;
    send(&app, id, json!({ "event": "join-note", "data": 2 })).await;

    assert!(app.state.registry.unregister(id));
    assert!(app.state.registry.room_members(1).is_empty());
    assert!(app.state.registry.room_members(2).is_empty());

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connections"], 0);
}

async fn open_socket(addr: SocketAddr) -> Client {
    let (socket, _) = connect_async(format!("ws://{}/ws", addr)).await.expect("ws connect");
    socket
}

async fn send_live(socket: &mut Client, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("ws send");
}

/// Next text frame as JSON; `None` once the server has closed the socket
async fn next_live(socket: &mut Client) -> Option<Value> {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame within timeout");
        match message {
            Some(Ok(Message::Text(text))) => {
                return Some(serde_json::from_str(text.as_str()).expect("frame is JSON"))
            }
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
            Some(Ok(_)) => {}
        }
    }
}

async fn wait_for(app: &TestApp, connections: usize) {
    let registry = &app.state.registry;
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.connection_count() != connections {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection count settles");
}

/// Open a live socket, authenticate it and join `note_id`
async fn joined_socket(app: &TestApp, addr: SocketAddr, user: &TestUser, note_id: i64) -> Client {
    let mut socket = open_socket(addr).await;
    send_live(&mut socket, json!({ "event": "authenticate", "data": user.token })).await;
    assert_eq!(
        next_live(&mut socket).await,
        Some(json!({ "event": "authenticated", "data": user.id }))
    );
    send_live(&mut socket, json!({ "event": "join-note", "data": note_id })).await;
    assert_eq!(
        next_live(&mut socket).await,
        Some(json!({ "event": "joined-note", "data": note_id }))
    );
    wait_for(app, 1).await;
    assert_eq!(app.state.registry.room_members(note_id).len(), 1);
    socket
}

#[tokio::test]
async fn test_live_socket_update_round_trip() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com").await;
    let note_id = app.create_note(&owner, "Doc", "v1").await;
    let (addr, server) = app.serve().await;

    let mut socket = joined_socket(&app, addr, &owner, note_id).await;
    let payload = json!({ "noteId": note_id, "content": "live" });
    send_live(&mut socket, json!({ "event": "note-update", "data": payload })).await;
    assert_eq!(
        next_live(&mut socket).await,
        Some(json!({ "event": "note-updated", "data": payload }))
    );
    assert_eq!(note_content(&app, &owner, note_id).await, "live");

    server.abort();
}

#[tokio::test]
async fn test_dropped_socket_is_unregistered() {
    let app = TestApp::new().await;
    let user = app.register("live@example.com").await;
    let note_id = app.create_note(&user, "Doc", "v1").await;
    let (addr, server) = app.serve().await;

    let socket = joined_socket(&app, addr, &user, note_id).await;
    drop(socket);

    wait_for(&app, 0).await;
    assert!(app.state.registry.room_members(note_id).is_empty());
    server.abort();
}

#[tokio::test]
async fn test_close_frame_unregisters_connection() {
    let app = TestApp::new().await;
    let user = app.register("live@example.com").await;
    let note_id = app.create_note(&user, "Doc", "v1").await;
    let (addr, server) = app.serve().await;

    let mut socket = joined_socket(&app, addr, &user, note_id).await;
    socket.close(None).await.expect("ws close");

    wait_for(&app, 0).await;
    assert!(app.state.registry.room_members(note_id).is_empty());
    server.abort();
}

#[tokio::test]
async fn test_logout_event_closes_live_socket() {
    let app = TestApp::new().await;
    let user = app.register("live@example.com").await;
    let note_id = app.create_note(&user, "Doc", "v1").await;
    let (addr, server) = app.serve().await;

    let mut socket = joined_socket(&app, addr, &user, note_id).await;
    send_live(&mut socket, json!({ "event": "logout" })).await;

    assert_eq!(next_live(&mut socket).await, None);
    wait_for(&app, 0).await;
    assert!(app.state.registry.room_members(note_id).is_empty());
    server.abort();
}

#[tokio::test]
async fn test_evicted_connection_loses_its_socket() {
    let app = TestApp::new().await;
    let user = app.register("live@example.com").await;
    let note_id = app.create_note(&user, "Doc", "v1").await;
    let (addr, server) = app.serve().await;

    let mut socket = joined_socket(&app, addr, &user, note_id).await;
    let id = app
        .state
        .registry
        .room_members(note_id)
        .into_iter()
        .next()
        .expect("member");

    // dropping the registry entry closes the outbox, so the writer task ends
    assert!(app.state.registry.unregister(id));
    assert_eq!(next_live(&mut socket).await, None);
    assert!(!app.state.registry.unregister(id));
    assert_eq!(app.state.registry.connection_count(), 0);
    server.abort();
}
