/**
 * Connection Registry
 *
 * Tracks every live real-time connection, its identity state and its room
 * memberships, and fans out frames to the members of a note's room.
 *
 * # Ownership
 *
 * One registry is built in `create_app` and shared through `AppState` as an
 * `Arc`. Tests build their own isolated instances.
 *
 * # Locking
 *
 * The connection table and the room index live in one `RegistryInner` under
 * a single `parking_lot::RwLock`. Every mutation (register, authenticate,
 * join, leave, unregister) takes the write lock once, so a connection is never
 * observable in a room after it has been unregistered. The lock is never held
 * across an `.await`: sends use `try_send` and do not block.
 *
 * # Backpressure
 *
 * Each outbox is a bounded channel of `OUTBOX_CAPACITY` frames. A member
 * whose outbox is full is not keeping up with its socket; the broadcast
 * skips it and the connection is unregistered, which closes its outbox and
 * ends its socket task.
 */
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::backend::auth::identity::{IdentityError, IdentityResolver};
use crate::backend::auth::sessions::AuthError;
use crate::backend::realtime::rooms::RoomIndex;
use crate::shared::{NoteId, UserId};

/// Serialized text frame shared by every recipient of a broadcast
pub type Frame = Arc<str>;

/// Frames a connection may have queued before it counts as stalled
pub const OUTBOX_CAPACITY: usize = 256;

/// Sending half of a connection's outbound queue
pub type Outbox = mpsc::Sender<Frame>;

/// Process-unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(UserId),
}

struct ConnectionEntry {
    auth: AuthState,
    outbox: Outbox,
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: RoomIndex,
}

/// Registry of live connections and their rooms
pub struct ConnectionRegistry {
    identity: IdentityResolver,
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new(identity: IdentityResolver) -> Self {
        Self {
            identity,
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Record a new, unauthenticated connection
    pub fn register(&self, id: ConnectionId, outbox: Outbox) {
        let mut inner = self.inner.write();
        inner.connections.insert(
            id,
            ConnectionEntry {
                auth: AuthState::Unauthenticated,
                outbox,
            },
        );
        tracing::debug!("[Realtime] connection {} registered ({} live)", id, inner.connections.len());
    }

    /// Resolve `credential` and bind its principal to the connection
    ///
    /// `credential` may be a raw token or `Bearer <token>`. It goes through
    /// the same `IdentityResolver` as the HTTP middleware, so a token whose
    /// account was deleted is refused here too. On failure the entry is left
    /// as it was.
    ///
    /// # Errors
    ///
    /// `AuthError::UnknownConnection` if `id` is not registered, otherwise
    /// whatever `IdentityResolver::resolve` reports.
    pub async fn authenticate(
        &self,
        id: ConnectionId,
        credential: &str,
    ) -> Result<UserId, IdentityError> {
        let known = self.inner.read().connections.contains_key(&id);
        if !known {
            return Err(AuthError::UnknownConnection.into());
        }

        let principal = self.identity.resolve(credential).await?.id;

        let mut inner = self.inner.write();
        let entry = inner
            .connections
            .get_mut(&id)
            .ok_or(AuthError::UnknownConnection)?;
        entry.auth = AuthState::Authenticated(principal);
        Ok(principal)
    }

    /// Principal bound to the connection, if authenticated
    pub fn identity_of(&self, id: ConnectionId) -> Option<UserId> {
        match self.inner.read().connections.get(&id)?.auth {
            AuthState::Authenticated(principal) => Some(principal),
            AuthState::Unauthenticated => None,
        }
    }

    /// Remove the connection and all of its room memberships
    ///
    /// Idempotent: returns `false` if the connection was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.write();
        if inner.connections.remove(&id).is_none() {
            return false;
        }
        let rooms = inner.rooms.drop_connection(id);
        tracing::debug!(
            "[Realtime] connection {} unregistered, left {} room(s) ({} live)",
            id,
            rooms.len(),
            inner.connections.len()
        );
        true
    }

    /// Subscribe the connection to a note's room
    ///
    /// Joining performs no permission check; membership only controls which
    /// broadcasts are delivered. Returns `false` for unknown connections.
    pub fn join(&self, id: ConnectionId, note: NoteId) -> bool {
        let mut inner = self.inner.write();
        if !inner.connections.contains_key(&id) {
            return false;
        }
        inner.rooms.join(id, note);
        true
    }

    /// Unsubscribe the connection from a note's room; no-op if absent
    pub fn leave(&self, id: ConnectionId, note: NoteId) -> bool {
        self.inner.write().rooms.leave(id, note)
    }

    /// Deliver `frame` to every current member of the room of `note`
    ///
    /// Returns the number of successful enqueues. Members whose connection is
    /// being torn down are skipped. Members whose outbox is full are skipped
    /// and unregistered.
    pub fn broadcast(&self, note: NoteId, frame: Frame) -> usize {
        let members: Vec<(ConnectionId, Outbox)> = {
            let inner = self.inner.read();
            inner
                .rooms
                .members(note)
                .filter_map(|id| {
                    inner
                        .connections
                        .get(&id)
                        .map(|entry| (id, entry.outbox.clone()))
                })
                .collect()
        };

        let mut delivered = 0;
        let mut stalled = Vec::new();
        for (id, outbox) in &members {
            match outbox.try_send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => stalled.push(*id),
                Err(TrySendError::Closed(_)) => {}
            }
        }

        for id in stalled {
            tracing::warn!("[Realtime] connection {} outbox full, disconnecting", id);
            self.unregister(id);
        }
        delivered
    }

    /// Deliver `frame` to a single connection
    ///
    /// Returns `false` for unknown connections and full or closed outboxes.
    pub fn send_to(&self, id: ConnectionId, frame: Frame) -> bool {
        let outbox = self
            .inner
            .read()
            .connections
            .get(&id)
            .map(|entry| entry.outbox.clone());
        match outbox {
            Some(outbox) => outbox.try_send(frame).is_ok(),
            None => false,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }

    pub fn room_members(&self, note: NoteId) -> HashSet<ConnectionId> {
        self.inner.read().rooms.members(note).collect()
    }

    pub fn rooms_of(&self, id: ConnectionId) -> HashSet<NoteId> {
        self.inner.read().rooms.rooms_of(id)
    }

    pub fn auth_state(&self, id: ConnectionId) -> Option<AuthState> {
        self.inner.read().connections.get(&id).map(|entry| entry.auth)
    }
}
