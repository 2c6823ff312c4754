/**
 * Room Index
 *
 * Bidirectional membership index between connections and note rooms:
 * room → connections for fan-out, connection → rooms for teardown.
 *
 * The index itself does no locking. `ConnectionRegistry` keeps it under the
 * same lock as the connection table so both directions, and the table, change
 * together.
 *
 * # Invariants
 *
 * - `c ∈ rooms[n]` ⇔ `n ∈ memberships[c]`
 * - no room or membership set is ever empty; empty sets are removed
 */
use std::collections::{HashMap, HashSet};

use crate::backend::realtime::registry::ConnectionId;
use crate::shared::NoteId;

#[derive(Debug, Default)]
pub struct RoomIndex {
    rooms: HashMap<NoteId, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<NoteId>>,
}

impl RoomIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to the room of `note`; returns false if already a member
    pub fn join(&mut self, connection: ConnectionId, note: NoteId) -> bool {
        let inserted = self.rooms.entry(note).or_default().insert(connection);
        self.memberships.entry(connection).or_default().insert(note);
        inserted
    }

    /// Remove `connection` from the room of `note`; no-op if absent
    pub fn leave(&mut self, connection: ConnectionId, note: NoteId) -> bool {
        let removed = remove_member(&mut self.rooms, note, &connection);
        remove_member(&mut self.memberships, connection, &note);
        removed
    }

    /// Remove `connection` from every room it joined
    ///
    /// Returns the rooms it was in.
    pub fn drop_connection(&mut self, connection: ConnectionId) -> HashSet<NoteId> {
        let notes = self.memberships.remove(&connection).unwrap_or_default();
        for note in &notes {
            remove_member(&mut self.rooms, *note, &connection);
        }
        notes
    }

    /// Current members of the room of `note`
    pub fn members(&self, note: NoteId) -> impl Iterator<Item = ConnectionId> + '_ {
        self.rooms.get(&note).into_iter().flatten().copied()
    }

    pub fn rooms_of(&self, connection: ConnectionId) -> HashSet<NoteId> {
        self.memberships.get(&connection).cloned().unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_member(&self, connection: ConnectionId, note: NoteId) -> bool {
        self.rooms
            .get(&note)
            .map(|members| members.contains(&connection))
            .unwrap_or(false)
    }
}

fn remove_member<K, V>(index: &mut HashMap<K, HashSet<V>>, key: K, value: &V) -> bool
where
    K: std::hash::Hash + Eq,
    V: std::hash::Hash + Eq,
{
    let Some(set) = index.get_mut(&key) else {
        return false;
    };
    let removed = set.remove(value);
    if set.is_empty() {
        index.remove(&key);
    }
    removed
}
