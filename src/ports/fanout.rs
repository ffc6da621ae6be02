//! FanoutPublisher port - Interface for fleet-wide event propagation.
//!
//! The room relay only ever delivers to connections on its own process.
//! This port is what makes delivery effectively fleet-wide: an accepted
//! event is published here, every process (including the publisher)
//! receives it from the shared channel and runs its own local delivery.

use async_trait::async_trait;

use crate::domain::event::RelayMessage;

/// Whether the cross-process channel is currently carrying traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutStatus {
    /// Both channel legs (publish and subscribe) are established.
    Active,
    /// The channel is down or not configured; events reach local
    /// connections only while reconnection proceeds in the background.
    SingleInstance,
}

/// Errors from the fan-out adapter.
///
/// Channel loss is not represented here: adapters degrade to local-only
/// delivery rather than failing the publish.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    /// The channel address could not be parsed at startup.
    #[error("Invalid fan-out channel address: {0}")]
    InvalidAddress(String),

    /// The message could not be encoded for the wire.
    #[error("Failed to encode fan-out message: {0}")]
    Encode(String),
}

/// Port for publishing relay messages to the whole fleet.
///
/// Implementations must:
/// - deliver the message to local subscribers even when the shared channel
///   is unavailable (single-instance degradation)
/// - treat "no subscriber anywhere" as success, not an error
///
/// # Example
///
/// ```ignore
/// let message = RelayMessage::transaction(event);
/// fanout.publish(message).await?;
/// ```
#[async_trait]
pub trait FanoutPublisher: Send + Sync {
    /// Publish a message for every subscriber of its room, fleet-wide.
    async fn publish(&self, message: RelayMessage) -> Result<(), FanoutError>;

    /// Current channel status, for health reporting.
    fn status(&self) -> FanoutStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn FanoutPublisher) {}

    // Compile-time check that trait is Send + Sync
    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn fanout_publisher_is_send_sync() {
        fn check<T: FanoutPublisher>() {
            assert_send_sync::<T>();
        }
        // The function existing is enough to prove the constraint
    }
}
