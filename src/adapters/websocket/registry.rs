//! Room-scoped connection registry.
//!
//! Tracks, per process, which connections have joined which rooms, in both
//! directions: room → member set for delivery, connection → room set for
//! disconnect cleanup. The registry also owns each connection's delivery
//! handle (the channel feeding its socket write loop), so delivery never
//! blocks on network I/O.
//!
//! # Locking
//!
//! Lock granularity is per-room. Member sets live behind their own
//! `RwLock`, reached through a briefly-held outer map lock; joins, leaves
//! and deliveries for different rooms proceed concurrently. Member-set
//! mutation always happens while holding an outer map guard (read for
//! existing rooms, write when creating or pruning a room), which is what
//! makes empty-room pruning safe against in-flight joins.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

use crate::domain::connection::ConnectionState;
use crate::domain::foundation::{ConnectionId, RoomId, StateMachine};

use super::messages::ServerMessage;

/// Result of a join operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Membership added.
    Joined,
    /// The connection already belonged to the room; nothing changed.
    AlreadyMember,
    /// The connection is no longer live; nothing changed.
    NotConnected,
}

struct ConnectionEntry {
    sender: UnboundedSender<ServerMessage>,
    rooms: RwLock<HashSet<RoomId>>,
    state: ConnectionState,
}

type MemberSet = Arc<RwLock<HashSet<ConnectionId>>>;

/// Per-process registry of live connections and their room memberships.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, MemberSet>>,
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new live connection.
    ///
    /// Returns the generated connection identifier and the receiving end of
    /// its delivery channel; the socket write loop drains the receiver.
    pub async fn register(&self) -> (ConnectionId, UnboundedReceiver<ServerMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = unbounded_channel();
        let entry = ConnectionEntry {
            sender: tx,
            rooms: RwLock::new(HashSet::new()),
            state: ConnectionState::Connected,
        };
        self.connections.write().await.insert(id, entry);
        tracing::debug!(connection_id = %id, "connection registered");
        (id, rx)
    }

    /// Removes a connection and its memberships.
    ///
    /// Returns the rooms the connection belonged to, for the lifecycle
    /// manager to notify; `None` if the connection was already removed,
    /// the caller's idempotency guard when disconnect is detected by more
    /// than one code path.
    pub async fn unregister(&self, id: &ConnectionId) -> Option<HashSet<RoomId>> {
        let mut entry = self.connections.write().await.remove(id)?;
        entry.state = entry
            .state
            .transition_to(ConnectionState::Disconnected)
            .unwrap_or(ConnectionState::Disconnected);

        let rooms = entry.rooms.into_inner();
        for room in &rooms {
            self.remove_member(room, id).await;
        }
        tracing::debug!(connection_id = %id, rooms = rooms.len(), "connection unregistered");
        Some(rooms)
    }

    /// Adds the connection to a room. Idempotent.
    pub async fn join(&self, id: &ConnectionId, room: &RoomId) -> JoinOutcome {
        let connections = self.connections.read().await;
        let Some(entry) = connections.get(id) else {
            return JoinOutcome::NotConnected;
        };
        if !entry.rooms.write().await.insert(room.clone()) {
            return JoinOutcome::AlreadyMember;
        }
        self.add_member(room, *id).await;
        JoinOutcome::Joined
    }

    /// Removes the connection from a room. No-op if it was not a member.
    ///
    /// Returns whether a membership was actually removed.
    pub async fn leave(&self, id: &ConnectionId, room: &RoomId) -> bool {
        let connections = self.connections.read().await;
        let Some(entry) = connections.get(id) else {
            return false;
        };
        if !entry.rooms.write().await.remove(room) {
            return false;
        }
        self.remove_member(room, id).await;
        true
    }

    /// The local members of a room; empty if the room has none.
    pub async fn members_of(&self, room: &RoomId) -> HashSet<ConnectionId> {
        let rooms = self.rooms.read().await;
        match rooms.get(room) {
            Some(set) => set.read().await.clone(),
            None => HashSet::new(),
        }
    }

    /// The rooms a connection has joined; empty if unknown.
    pub async fn rooms_of(&self, id: &ConnectionId) -> HashSet<RoomId> {
        let connections = self.connections.read().await;
        match connections.get(id) {
            Some(entry) => entry.rooms.read().await.clone(),
            None => HashSet::new(),
        }
    }

    /// Pushes a message into a connection's delivery channel.
    ///
    /// Returns false if the connection is gone or its channel closed; the
    /// caller treats that as a per-connection delivery miss, not an error.
    pub async fn deliver(&self, id: &ConnectionId, message: ServerMessage) -> bool {
        let connections = self.connections.read().await;
        match connections.get(id) {
            Some(entry) => entry.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Number of local members in a room.
    pub async fn member_count(&self, room: &RoomId) -> usize {
        let rooms = self.rooms.read().await;
        match rooms.get(room) {
            Some(set) => set.read().await.len(),
            None => 0,
        }
    }

    /// All rooms with at least one local member.
    pub async fn active_rooms(&self) -> Vec<RoomId> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// Total live connections on this process.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    async fn add_member(&self, room: &RoomId, id: ConnectionId) {
        {
            let rooms = self.rooms.read().await;
            if let Some(set) = rooms.get(room) {
                set.write().await.insert(id);
                return;
            }
        }
        // Room does not exist yet; create it under the map write lock so
        // the insert cannot race a concurrent prune.
        let mut rooms = self.rooms.write().await;
        let set = rooms
            .entry(room.clone())
            .or_insert_with(|| Arc::new(RwLock::new(HashSet::new())))
            .clone();
        set.write().await.insert(id);
    }

    async fn remove_member(&self, room: &RoomId, id: &ConnectionId) {
        let emptied = {
            let rooms = self.rooms.read().await;
            match rooms.get(room) {
                Some(set) => {
                    let mut members = set.write().await;
                    members.remove(id);
                    members.is_empty()
                }
                None => false,
            }
        };
        if emptied {
            self.prune_if_empty(room).await;
        }
    }

    // A room is only a key with members; once the last member leaves the
    // key goes too. Emptiness is re-checked under the map write lock
    // because a join may have landed since the caller observed it.
    async fn prune_if_empty(&self, room: &RoomId) {
        let mut rooms = self.rooms.write().await;
        if let Some(set) = rooms.get(room) {
            if set.read().await.is_empty() {
                rooms.remove(room);
            }
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
