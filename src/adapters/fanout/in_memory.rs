//! In-memory fan-out bus.
//!
//! Dispatches every published envelope to all attached relays, modeling
//! the shared channel without any external service. Tests attach several
//! relay instances to one bus to simulate a multi-process fleet;
//! deliberately single-process deployments use it as their (local-only)
//! publish path.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::adapters::websocket::RoomRelay;
use crate::domain::event::RelayMessage;
use crate::ports::{FanoutError, FanoutPublisher, FanoutStatus};

/// Fan-out bus that never leaves the process.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. Acceptable for test
/// and single-process use; fleet deployments use the Redis adapter.
pub struct InMemoryFanoutBus {
    relays: RwLock<Vec<Arc<RoomRelay>>>,
    published: RwLock<Vec<RelayMessage>>,
}

impl InMemoryFanoutBus {
    /// Creates a bus with no attached relays.
    pub fn new() -> Self {
        Self {
            relays: RwLock::new(Vec::new()),
            published: RwLock::new(Vec::new()),
        }
    }

    /// Attaches a relay; it will receive every subsequently published
    /// message, exactly like a process subscribed to the shared channel.
    pub async fn attach(&self, relay: Arc<RoomRelay>) {
        self.relays
            .write()
            .expect("InMemoryFanoutBus: relays lock poisoned")
            .push(relay);
    }

    // === Test Helpers ===

    /// Returns all published messages (for test assertions).
    pub fn published_messages(&self) -> Vec<RelayMessage> {
        self.published
            .read()
            .expect("InMemoryFanoutBus: published lock poisoned")
            .clone()
    }

    /// Returns count of published messages.
    pub fn message_count(&self) -> usize {
        self.published
            .read()
            .expect("InMemoryFanoutBus: published lock poisoned")
            .len()
    }

    /// Clears recorded messages (for test isolation).
    pub fn clear(&self) {
        self.published
            .write()
            .expect("InMemoryFanoutBus: published write lock poisoned")
            .clear();
    }
}

impl Default for InMemoryFanoutBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FanoutPublisher for InMemoryFanoutBus {
    async fn publish(&self, message: RelayMessage) -> Result<(), FanoutError> {
        self.published
            .write()
            .expect("InMemoryFanoutBus: published write lock poisoned")
            .push(message.clone());

        // Snapshot to release the lock before the await points.
        let relays: Vec<Arc<RoomRelay>> = self
            .relays
            .read()
            .expect("InMemoryFanoutBus: relays lock poisoned")
            .clone();

        for relay in relays {
            relay.deliver_local(&message).await;
        }
        Ok(())
    }

    fn status(&self) -> FanoutStatus {
        // No cross-process channel is involved.
        FanoutStatus::SingleInstance
    }
}
