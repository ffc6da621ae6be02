//! WebSocket message types for the client-facing relay protocol.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection status, room replies, relayed events
//! - Client → Server: room commands, chat, pings

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::event::{RelayBody, RelayMessage};
use crate::domain::foundation::ConnectionId;

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Connection established successfully.
    Connected(ConnectedMessage),

    /// Join request accepted.
    RoomJoined(RoomJoinedMessage),

    /// Join request rejected.
    RoomJoinError(ErrorMessage),

    /// Leave request processed.
    RoomLeft(RoomLeftMessage),

    /// A transaction event for one of the client's rooms.
    TransactionUpdate(TransactionUpdateMessage),

    /// A connection joined one of the client's rooms.
    UserJoined(MembershipMessage),

    /// A connection left one of the client's rooms.
    UserLeft(MembershipMessage),

    /// A chat message for one of the client's rooms.
    NewMessage(ChatMessage),

    /// Chat request rejected.
    MessageError(ErrorMessage),

    /// Heartbeat response.
    Pong,
}

/// Sent when a connection is established.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub timestamp: String,
}

/// Sent when a join request succeeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedMessage {
    pub room: String,
    pub connection_id: String,
}

/// Sent when a leave request is processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomLeftMessage {
    pub room: String,
}

/// A relayed transaction event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdateMessage {
    pub room: String,
    pub event_kind: String,
    pub data: Value,
}

/// Room membership change notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipMessage {
    pub room: String,
    pub connection_id: String,
}

/// A relayed chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub room: String,
    pub sender: String,
    pub message: Value,
}

/// Error reply, surfaced only to the requesting connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ServerMessage {
    /// Converts a relay message into its client-facing representation.
    pub fn from_relay(message: &RelayMessage) -> Self {
        let room = message.room.to_string();
        match &message.body {
            RelayBody::Transaction {
                event_kind,
                payload,
            } => ServerMessage::TransactionUpdate(TransactionUpdateMessage {
                room,
                event_kind: event_kind.to_string(),
                data: payload.clone(),
            }),
            RelayBody::Chat { sender, message } => ServerMessage::NewMessage(ChatMessage {
                room,
                sender: sender.to_string(),
                message: message.clone(),
            }),
            RelayBody::MemberJoined { connection_id } => {
                ServerMessage::UserJoined(MembershipMessage {
                    room,
                    connection_id: connection_id.to_string(),
                })
            }
            RelayBody::MemberLeft { connection_id } => {
                ServerMessage::UserLeft(MembershipMessage {
                    room,
                    connection_id: connection_id.to_string(),
                })
            }
        }
    }

    /// Shorthand for a join success reply.
    pub fn room_joined(room: &str, connection_id: &ConnectionId) -> Self {
        ServerMessage::RoomJoined(RoomJoinedMessage {
            room: room.to_string(),
            connection_id: connection_id.to_string(),
        })
    }

    /// Shorthand for a join rejection reply.
    pub fn room_join_error(message: impl Into<String>) -> Self {
        ServerMessage::RoomJoinError(ErrorMessage {
            message: message.into(),
        })
    }

    /// Shorthand for a chat rejection reply.
    pub fn message_error(message: impl Into<String>) -> Self {
        ServerMessage::MessageError(ErrorMessage {
            message: message.into(),
        })
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from a client.
///
/// Room names arrive as plain strings; validation happens in the lifecycle
/// manager so a malformed request is answered, never dropped silently.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Request to join a room.
    JoinRoom { room: String },

    /// Request to leave a room.
    LeaveRoom { room: String },

    /// Chat message addressed to a room.
    SendMessage { room: Option<String>, message: Value },

    /// Heartbeat request.
    Ping,
}
