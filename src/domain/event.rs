//! Canonical relay event types.
//!
//! A [`TransactionEvent`] is the unit producers submit: a destination room,
//! a kind tag, and an opaque payload. [`RelayMessage`] is the unit the room
//! relay delivers and the fan-out channel carries: a room plus one of the
//! bodies a subscriber can observe. Payload contents are never inspected
//! beyond the object-shape check at the boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::foundation::{ConnectionId, RoomId, ValidationError};

/// Transaction kind tag.
///
/// The known kinds are delivery (`teslimat`), withdrawal (`cekim`) and
/// deposit (`yatirim`), but the set is open: any non-blank tag is accepted
/// and preserved exactly on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventKind(String);

/// Kind tags the original producer integrations emit.
pub const KNOWN_EVENT_KINDS: &[&str] = &["teslimat", "cekim", "yatirim"];

impl EventKind {
    /// Creates an EventKind, rejecting empty or whitespace-only tags.
    pub fn new(kind: impl Into<String>) -> Result<Self, ValidationError> {
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err(ValidationError::empty_field("eventKind"));
        }
        Ok(Self(kind))
    }

    /// Returns the kind tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the kinds known producer integrations emit.
    pub fn is_known(&self) -> bool {
        KNOWN_EVENT_KINDS.contains(&self.0.as_str())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EventKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.0
    }
}

/// A producer-submitted transaction notification.
///
/// Immutable once accepted; fire-and-forget, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub room: RoomId,
    pub kind: EventKind,
    pub payload: Value,
}

impl TransactionEvent {
    /// Creates a transaction event, rejecting non-object payloads.
    pub fn new(room: RoomId, kind: EventKind, payload: Value) -> Result<Self, ValidationError> {
        if !payload.is_object() {
            return Err(ValidationError::invalid_format(
                "payload",
                "must be a JSON object",
            ));
        }
        Ok(Self {
            room,
            kind,
            payload,
        })
    }
}

/// Body of a message delivered to a room's subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayBody {
    /// A producer transaction notification.
    Transaction {
        event_kind: EventKind,
        payload: Value,
    },
    /// A free-form chat message from a room member.
    Chat {
        sender: ConnectionId,
        message: Value,
    },
    /// A connection joined the room.
    MemberJoined { connection_id: ConnectionId },
    /// A connection left the room.
    MemberLeft { connection_id: ConnectionId },
}

/// The unit the room relay delivers, and the envelope the fan-out channel
/// carries across processes (serialized as JSON, preserving the room
/// identifier, kind tag, and payload structure exactly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub room: RoomId,
    #[serde(flatten)]
    pub body: RelayBody,
}

impl RelayMessage {
    /// Wraps a transaction event for delivery.
    pub fn transaction(event: TransactionEvent) -> Self {
        Self {
            room: event.room,
            body: RelayBody::Transaction {
                event_kind: event.kind,
                payload: event.payload,
            },
        }
    }

    /// A chat broadcast from a room member.
    pub fn chat(room: RoomId, sender: ConnectionId, message: Value) -> Self {
        Self {
            room,
            body: RelayBody::Chat { sender, message },
        }
    }

    /// A member-joined notification.
    pub fn member_joined(room: RoomId, connection_id: ConnectionId) -> Self {
        Self {
            room,
            body: RelayBody::MemberJoined { connection_id },
        }
    }

    /// A member-left notification.
    pub fn member_left(room: RoomId, connection_id: ConnectionId) -> Self {
        Self {
            room,
            body: RelayBody::MemberLeft { connection_id },
        }
    }
}
