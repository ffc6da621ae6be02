//! Connection lifecycle manager.
//!
//! Owns the connect → join/leave → disconnect transitions for every client
//! connection, applying the deployment's room policy and keeping registry
//! membership consistent with the set of live connections. Replies to a
//! connection's own requests go straight to its delivery channel; room
//! broadcasts go through the fan-out publisher so the whole fleet sees
//! them.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::domain::event::RelayMessage;
use crate::domain::foundation::{ConnectionId, RoomId, Timestamp, ValidationError};
use crate::domain::policy::{PolicyViolation, RoomPolicy};
use crate::ports::FanoutPublisher;

use super::messages::{ConnectedMessage, ServerMessage};
use super::registry::{JoinOutcome, RoomRegistry};
use super::relay::RoomRelay;

/// A join or leave request that could not be honored.
///
/// Surfaced only to the requesting connection; registry state is never
/// mutated by a rejected request.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("{0}")]
    InvalidRoom(#[from] ValidationError),

    #[error("{0}")]
    NotAllowed(#[from] PolicyViolation),

    #[error("Connection is no longer live")]
    NotConnected,
}

/// A chat request that could not be honored.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("A room is required to send a message")]
    MissingRoom,

    #[error("{0}")]
    InvalidRoom(#[from] ValidationError),

    #[error("Cannot send to a room this connection has not joined")]
    NotAMember,
}

/// Drives connection state transitions and room membership.
pub struct ConnectionLifecycle {
    registry: Arc<RoomRegistry>,
    relay: Arc<RoomRelay>,
    fanout: Arc<dyn FanoutPublisher>,
    policy: RoomPolicy,
}

impl ConnectionLifecycle {
    pub fn new(
        registry: Arc<RoomRegistry>,
        relay: Arc<RoomRelay>,
        fanout: Arc<dyn FanoutPublisher>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            registry,
            relay,
            fanout,
            policy,
        }
    }

    /// Establishes a new connection.
    ///
    /// Registers the delivery handle, sends the `connected` greeting, and
    /// auto-joins the configured room when the deployment profile has one.
    /// Returns the connection id and the receiver the socket write loop
    /// drains.
    pub async fn connect(
        &self,
    ) -> (
        ConnectionId,
        tokio::sync::mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        let (id, rx) = self.registry.register().await;
        tracing::info!(connection_id = %id, "client connected");

        self.registry
            .deliver(
                &id,
                ServerMessage::Connected(ConnectedMessage {
                    connection_id: id.to_string(),
                    timestamp: Timestamp::now().to_rfc3339(),
                }),
            )
            .await;

        if let Some(room) = self.policy.auto_join_room().cloned() {
            if self.registry.join(&id, &room).await == JoinOutcome::Joined {
                self.registry
                    .deliver(&id, ServerMessage::room_joined(room.as_str(), &id))
                    .await;
                self.announce_membership(RelayMessage::member_joined(room, id))
                    .await;
            }
        }

        (id, rx)
    }

    /// Handles an explicit join request.
    ///
    /// On success the requester gets `room-joined`; a repeated join is
    /// answered the same way without changing membership. On failure the
    /// requester gets `room-join-error` and nothing else changes.
    pub async fn join(&self, id: &ConnectionId, room_name: &str) -> Result<RoomId, JoinError> {
        let room = match self.validate_room(room_name) {
            Ok(room) => room,
            Err(err) => {
                tracing::warn!(connection_id = %id, error = %err, "join rejected");
                self.registry
                    .deliver(id, ServerMessage::room_join_error(err.to_string()))
                    .await;
                return Err(err);
            }
        };

        match self.registry.join(id, &room).await {
            JoinOutcome::Joined => {
                tracing::info!(connection_id = %id, room = %room, "joined room");
                self.registry
                    .deliver(id, ServerMessage::room_joined(room.as_str(), id))
                    .await;
                if self.policy.auto_join_room().is_some() {
                    self.announce_membership(RelayMessage::member_joined(room.clone(), *id))
                        .await;
                }
                Ok(room)
            }
            JoinOutcome::AlreadyMember => {
                self.registry
                    .deliver(id, ServerMessage::room_joined(room.as_str(), id))
                    .await;
                Ok(room)
            }
            JoinOutcome::NotConnected => Err(JoinError::NotConnected),
        }
    }

    /// Handles an explicit leave request.
    ///
    /// The requester gets `room-left` whether or not it was a member; the
    /// room's remaining local members get a `user-left` notification when
    /// a membership was actually removed.
    pub async fn leave(&self, id: &ConnectionId, room_name: &str) -> Result<RoomId, JoinError> {
        let room = match self.validate_room(room_name) {
            Ok(room) => room,
            Err(err) => {
                self.registry
                    .deliver(id, ServerMessage::room_join_error(err.to_string()))
                    .await;
                return Err(err);
            }
        };

        let removed = self.registry.leave(id, &room).await;
        self.registry
            .deliver(
                id,
                ServerMessage::RoomLeft(super::messages::RoomLeftMessage {
                    room: room.to_string(),
                }),
            )
            .await;
        if removed {
            tracing::info!(connection_id = %id, room = %room, "left room");
            self.relay
                .deliver_local(&RelayMessage::member_left(room.clone(), *id))
                .await;
        }
        Ok(room)
    }

    /// Handles a chat message addressed to one of the sender's rooms.
    pub async fn chat(
        &self,
        id: &ConnectionId,
        room_name: Option<String>,
        message: Value,
    ) -> Result<(), ChatError> {
        let result = self.validate_chat(id, room_name).await;
        let room = match result {
            Ok(room) => room,
            Err(err) => {
                tracing::warn!(connection_id = %id, error = %err, "chat rejected");
                self.registry
                    .deliver(id, ServerMessage::message_error(err.to_string()))
                    .await;
                return Err(err);
            }
        };

        if let Err(err) = self
            .fanout
            .publish(RelayMessage::chat(room, *id, message))
            .await
        {
            tracing::warn!(connection_id = %id, error = %err, "chat publish failed");
        }
        Ok(())
    }

    /// Tears down a connection.
    ///
    /// Safe to call from every disconnect detection path; the registry
    /// unregister is the idempotency guard, so cleanup and notifications
    /// run exactly once. The `user-left` notifications are local and
    /// best-effort; correctness of future deliveries rests on the
    /// membership removal alone.
    pub async fn disconnect(&self, id: &ConnectionId) {
        let Some(rooms) = self.registry.unregister(id).await else {
            tracing::trace!(connection_id = %id, "disconnect already processed");
            return;
        };
        tracing::info!(connection_id = %id, "client disconnected");

        for room in rooms {
            self.relay
                .deliver_local(&RelayMessage::member_left(room, *id))
                .await;
        }
    }

    /// Answers a heartbeat.
    pub async fn pong(&self, id: &ConnectionId) {
        self.registry.deliver(id, ServerMessage::Pong).await;
    }

    fn validate_room(&self, room_name: &str) -> Result<RoomId, JoinError> {
        let room = RoomId::new(room_name)?;
        self.policy.authorize(&room)?;
        Ok(room)
    }

    async fn validate_chat(
        &self,
        id: &ConnectionId,
        room_name: Option<String>,
    ) -> Result<RoomId, ChatError> {
        let room_name = room_name.ok_or(ChatError::MissingRoom)?;
        let room = RoomId::new(room_name)?;
        if !self.registry.rooms_of(id).await.contains(&room) {
            return Err(ChatError::NotAMember);
        }
        Ok(room)
    }

    async fn announce_membership(&self, message: RelayMessage) {
        if let Err(err) = self.fanout.publish(message).await {
            tracing::warn!(error = %err, "membership announce failed");
        }
    }
}
