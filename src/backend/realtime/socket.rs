/**
 * WebSocket Channel Handler
 *
 * This module implements the `/ws` endpoint. A connection is registered as
 * unauthenticated on upgrade; the client then sends an `authenticate` frame,
 * joins note rooms and sends `note-update` frames.
 *
 * # Tasks
 *
 * Each connection runs two tasks:
 * - the reader loop (this handler), which decodes client frames
 * - a writer task that drains the connection's outbox into the socket
 *
 * # Connection Management
 *
 * Whatever ends the reader loop (peer close, read error, `logout`, writer
 * failure), the connection goes through a single cleanup path that calls
 * `ConnectionRegistry::unregister`. Rejected frames never close the socket.
 * A connection the registry evicts for a full outbox loses its last sender,
 * so the writer task drains and finishes and the reader loop ends with it.
 */
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::backend::auth::sessions::AuthError;
use crate::backend::realtime::pipeline::handle_note_update;
use crate::backend::realtime::registry::{ConnectionId, Frame, OUTBOX_CAPACITY};
use crate::backend::server::state::AppState;
use crate::shared::event::{parse_token, ClientEvent, ErrorNotice, ServerEvent};

/// What the reader loop should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Handle WebSocket upgrade (GET /ws)
///
/// No credential is required to upgrade; identity is established by the
/// first successful `authenticate` frame.
pub async fn handle_socket_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

async fn run_connection(socket: WebSocket, state: AppState) {
    let id = ConnectionId::new();
    let (outbox, mut frames) = mpsc::channel::<Frame>(OUTBOX_CAPACITY);
    state.registry.register(id, outbox);
    tracing::info!("[Realtime] connection {} opened", id);

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Err(e) = sink.send(Message::Text(frame.to_string().into())).await {
                tracing::debug!("[Realtime] write failed: {}", e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if handle_frame(&state, id, text.as_str()).await == Flow::Close {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("[Realtime] read error on {}: {}", id, e);
                    break;
                }
            },
            _ = &mut writer => {
                tracing::debug!("[Realtime] writer for {} finished", id);
                break;
            }
        }
    }

    state.registry.unregister(id);
    writer.abort();
    tracing::info!("[Realtime] connection {} closed", id);
}

/// Process one client text frame for connection `id`
///
/// Replies are queued on the connection's outbox.
pub async fn handle_frame(state: &AppState, id: ConnectionId, text: &str) -> Flow {
    let event = match ClientEvent::parse(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("[Realtime] unreadable frame from {}: {}", id, e);
            reply(
                state,
                id,
                ServerEvent::Error(ErrorNotice {
                    message: e.to_string(),
                }),
            );
            return Flow::Continue;
        }
    };
    tracing::debug!("[Realtime] {} from {}", event.name(), id);

    match event {
        ClientEvent::Authenticate(raw) => {
            let result = match parse_token(raw) {
                Ok(token) => state.registry.authenticate(id, &token).await,
                Err(_) => Err(AuthError::MalformedToken.into()),
            };
            match result {
                Ok(principal) => {
                    tracing::info!("[Realtime] connection {} authenticated as {}", id, principal);
                    reply(state, id, ServerEvent::Authenticated(principal));
                }
                Err(e) => {
                    tracing::warn!("[Realtime] authentication failed on {}: {}", id, e);
                    reply(state, id, ServerEvent::AuthError(e.to_string()));
                }
            }
        }
        ClientEvent::JoinNote(note) => {
            if state.registry.join(id, note) {
                reply(state, id, ServerEvent::JoinedNote(note));
            }
        }
        ClientEvent::LeaveNote(note) => {
            state.registry.leave(id, note);
        }
        ClientEvent::NoteUpdate(raw) => {
            handle_note_update(
                &state.pool,
                &state.registry,
                id,
                raw,
                state.config.notify_rejected_updates,
            )
            .await;
        }
        ClientEvent::Logout => return Flow::Close,
    }

    Flow::Continue
}

fn reply(state: &AppState, id: ConnectionId, event: ServerEvent<'_>) {
    match event.to_frame() {
        Ok(frame) => {
            state.registry.send_to(id, Frame::from(frame));
        }
        Err(e) => tracing::error!("[Realtime] failed to encode reply for {}: {}", id, e),
    }
}
