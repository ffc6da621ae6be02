//! Room relay - local delivery of relay messages.
//!
//! `deliver_local` is deliberately oblivious to cross-process concerns: it
//! resolves the room's local members and pushes the message to each. The
//! fan-out adapter makes it fleet-wide by calling it on every process.

use std::sync::Arc;

use crate::domain::event::RelayMessage;

use super::messages::ServerMessage;
use super::registry::RoomRegistry;

/// What happened to one locally delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The room had no local members and the drop policy is active.
    Dropped,
    /// The message was pushed to every resolved member.
    Delivered {
        /// Members whose channel accepted the message.
        recipients: usize,
        /// Members whose transport closed mid-delivery.
        failed: usize,
    },
}

/// Delivers relay messages to the local members of their room.
pub struct RoomRelay {
    registry: Arc<RoomRegistry>,
    deliver_to_empty: bool,
}

impl RoomRelay {
    /// Creates a relay over the given registry with the default drop
    /// policy (events for empty rooms are dropped).
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            deliver_to_empty: false,
        }
    }

    /// Overrides the empty-room policy: deliver (to zero members) instead
    /// of dropping.
    pub fn with_deliver_to_empty(mut self, deliver_to_empty: bool) -> Self {
        self.deliver_to_empty = deliver_to_empty;
        self
    }

    /// Delivers a message to every local member of its room.
    ///
    /// A room with no local members produces no downstream action and no
    /// error. That is steady state on most processes of the fleet, so it is
    /// traced at debug level. A member whose transport closed mid-delivery
    /// is skipped; the remaining members still receive the message.
    pub async fn deliver_local(&self, message: &RelayMessage) -> DeliveryOutcome {
        let members = self.registry.members_of(&message.room).await;

        if members.is_empty() && !self.deliver_to_empty {
            tracing::debug!(room = %message.room, "no local members, dropping");
            return DeliveryOutcome::Dropped;
        }

        let outbound = ServerMessage::from_relay(message);
        let mut recipients = 0;
        let mut failed = 0;
        for member in &members {
            if self.registry.deliver(member, outbound.clone()).await {
                recipients += 1;
            } else {
                failed += 1;
                tracing::debug!(
                    room = %message.room,
                    connection_id = %member,
                    "transport closed mid-delivery"
                );
            }
        }

        tracing::trace!(room = %message.room, recipients, failed, "delivered");
        DeliveryOutcome::Delivered { recipients, failed }
    }
}
