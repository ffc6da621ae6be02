//! Redis pub/sub fan-out adapter.
//!
//! One named channel carries every relay envelope for the deployment.
//! Publishing happens over a multiplexed connection; receiving requires a
//! dedicated pub/sub connection. Both must be up before the adapter calls
//! itself active; a half-working pair would accept publishes nobody
//! receives, so either leg failing degrades the whole adapter to
//! single-instance mode.
//!
//! The publisher subscribes to the channel like every other process and
//! delivers its own messages on receipt, keeping the publish step the
//! single fan-out point. In degraded mode `publish` falls back to direct
//! local delivery and a background task keeps retrying the channel with
//! exponential backoff, indefinitely.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::RwLock;

use crate::adapters::websocket::RoomRelay;
use crate::config::RedisConfig;
use crate::domain::event::RelayMessage;
use crate::ports::{FanoutError, FanoutPublisher, FanoutStatus};

/// Fan-out adapter over a shared Redis pub/sub channel.
pub struct RedisFanout {
    client: redis::Client,
    channel: String,
    relay: Arc<RoomRelay>,
    publish_conn: RwLock<Option<MultiplexedConnection>>,
    active: AtomicBool,
    backoff_base: Duration,
    backoff_cap: Duration,
}

impl RedisFanout {
    /// Creates the adapter.
    ///
    /// Only a malformed channel address fails here, and is fatal at boot
    /// by design. An unreachable server is not an error: the adapter
    /// starts degraded and connects in the background.
    pub fn new(config: &RedisConfig, relay: Arc<RoomRelay>) -> Result<Arc<Self>, FanoutError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| FanoutError::InvalidAddress(e.to_string()))?;
        Ok(Arc::new(Self {
            client,
            channel: config.channel.clone(),
            relay,
            publish_conn: RwLock::new(None),
            active: AtomicBool::new(false),
            backoff_base: config.backoff_base(),
            backoff_cap: config.backoff_cap(),
        }))
    }

    /// Starts the background connect-and-listen task.
    ///
    /// Runs for the life of the process: establish both channel legs,
    /// serve the subscription until it drops, degrade, back off, repeat.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run().await })
    }

    async fn run(self: Arc<Self>) {
        let mut attempt: u32 = 0;
        loop {
            match self.connect_both().await {
                Ok((conn, pubsub)) => {
                    *self.publish_conn.write().await = Some(conn);
                    self.active.store(true, Ordering::SeqCst);
                    attempt = 0;
                    tracing::info!(channel = %self.channel, "fan-out channel active");

                    self.listen(pubsub).await;

                    self.active.store(false, Ordering::SeqCst);
                    *self.publish_conn.write().await = None;
                    tracing::warn!(
                        channel = %self.channel,
                        "fan-out channel lost, serving local-only traffic"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        channel = %self.channel,
                        error = %e,
                        "fan-out channel unavailable, serving local-only traffic"
                    );
                }
            }

            attempt = attempt.saturating_add(1);
            tokio::time::sleep(self.backoff_delay(attempt)).await;
        }
    }

    /// Establishes both channel legs; the subscription is confirmed
    /// before the adapter is declared active.
    async fn connect_both(
        &self,
    ) -> Result<(MultiplexedConnection, redis::aio::PubSub), redis::RedisError> {
        let conn = self.client.get_multiplexed_tokio_connection().await?;
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.subscribe(&self.channel).await?;
        Ok((conn, pubsub))
    }

    async fn listen(&self, mut pubsub: redis::aio::PubSub) {
        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable fan-out payload");
                    continue;
                }
            };
            match serde_json::from_str::<RelayMessage>(&payload) {
                Ok(message) => {
                    self.relay.deliver_local(&message).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "undecodable fan-out envelope");
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.backoff_base.saturating_mul(1u32 << shift);
        delay.min(self.backoff_cap)
    }
}

#[async_trait]
impl FanoutPublisher for RedisFanout {
    async fn publish(&self, message: RelayMessage) -> Result<(), FanoutError> {
        if self.active.load(Ordering::SeqCst) {
            let payload =
                serde_json::to_string(&message).map_err(|e| FanoutError::Encode(e.to_string()))?;
            let conn = self.publish_conn.read().await.clone();
            if let Some(mut conn) = conn {
                match conn.publish::<_, _, ()>(&self.channel, payload).await {
                    // Delivery happens on receipt; the publisher is
                    // subscribed to its own channel like everyone else.
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        tracing::warn!(error = %e, "publish failed, degrading to local delivery");
                        self.active.store(false, Ordering::SeqCst);
                        *self.publish_conn.write().await = None;
                    }
                }
            }
        }

        // Single-instance mode: the message still reaches local members.
        self.relay.deliver_local(&message).await;
        Ok(())
    }

    fn status(&self) -> FanoutStatus {
        if self.active.load(Ordering::SeqCst) {
            FanoutStatus::Active
        } else {
            FanoutStatus::SingleInstance
        }
    }
}
