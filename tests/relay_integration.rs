//! Integration tests for the room relay across a simulated fleet.
//!
//! These tests verify the end-to-end flow:
//! 1. Producer event → fan-out publish → every process's local delivery
//! 2. Room-scoped isolation between subscribers
//! 3. Lifecycle cleanup keeping membership consistent with live connections
//! 4. Single-instance degradation when the shared channel is unreachable
//!
//! The fleet is modeled with several relay instances attached to one
//! in-memory fan-out bus; each instance owns its own registry exactly as a
//! real process would.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use roomcast::adapters::fanout::{InMemoryFanoutBus, RedisFanout};
use roomcast::adapters::websocket::{ConnectionLifecycle, RoomRegistry, RoomRelay, ServerMessage};
use roomcast::config::RedisConfig;
use roomcast::domain::event::{EventKind, RelayMessage, TransactionEvent};
use roomcast::domain::foundation::{ConnectionId, RoomId};
use roomcast::domain::policy::RoomPolicy;
use roomcast::ports::FanoutPublisher;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// One relay process of the fleet.
struct RelayProcess {
    registry: Arc<RoomRegistry>,
    lifecycle: Arc<ConnectionLifecycle>,
}

impl RelayProcess {
    /// Boots a process attached to the shared bus.
    async fn start(bus: &Arc<InMemoryFanoutBus>, policy: RoomPolicy) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let relay = Arc::new(RoomRelay::new(registry.clone()));
        bus.attach(relay.clone()).await;
        let lifecycle = Arc::new(ConnectionLifecycle::new(
            registry.clone(),
            relay,
            bus.clone() as Arc<dyn FanoutPublisher>,
            policy,
        ));
        Self {
            registry,
            lifecycle,
        }
    }

    /// Connects a client and drains the `connected` greeting.
    async fn connect_client(&self) -> (ConnectionId, UnboundedReceiver<ServerMessage>) {
        let (id, mut rx) = self.lifecycle.connect().await;
        assert!(matches!(rx.recv().await, Some(ServerMessage::Connected(_))));
        (id, rx)
    }

    /// Joins a room and drains the `room-joined` reply.
    async fn join(&self, id: &ConnectionId, room: &str, rx: &mut UnboundedReceiver<ServerMessage>) {
        self.lifecycle.join(id, room).await.unwrap();
        assert!(matches!(rx.recv().await, Some(ServerMessage::RoomJoined(_))));
    }
}

fn transaction(room: &str, kind: &str, payload: serde_json::Value) -> RelayMessage {
    RelayMessage::transaction(
        TransactionEvent::new(
            RoomId::new(room).unwrap(),
            EventKind::new(kind).unwrap(),
            payload,
        )
        .unwrap(),
    )
}

fn expect_transaction(
    message: Option<ServerMessage>,
) -> roomcast::adapters::websocket::messages::TransactionUpdateMessage {
    match message {
        Some(ServerMessage::TransactionUpdate(update)) => update,
        other => panic!("expected transaction-update, got {:?}", other),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn subscriber_receives_event_for_its_room() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let process = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;

    let (a, mut rx_a) = process.connect_client().await;
    process.join(&a, "X1", &mut rx_a).await;

    bus.publish(transaction("X1", "teslimat", json!({"amount": 100})))
        .await
        .unwrap();

    let update = expect_transaction(rx_a.recv().await);
    assert_eq!(update.event_kind, "teslimat");
    assert_eq!(update.data, json!({"amount": 100}));
}

#[tokio::test]
async fn event_for_empty_room_is_dropped_everywhere() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let process = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;

    let (a, mut rx_a) = process.connect_client().await;
    process.join(&a, "X1", &mut rx_a).await;

    // Publish succeeds even though nobody joined X2; acceptance is the
    // producer contract, observation is not.
    bus.publish(transaction("X2", "teslimat", json!({})))
        .await
        .unwrap();

    assert_eq!(bus.message_count(), 1);
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn event_reaches_subscribers_on_every_process() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let p1 = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;
    let p2 = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;

    let (a, mut rx_a) = p1.connect_client().await;
    let (b, mut rx_b) = p2.connect_client().await;
    p1.join(&a, "X3", &mut rx_a).await;
    p2.join(&b, "X3", &mut rx_b).await;

    // Submitted on P1, observed on both P1 and P2.
    bus.publish(transaction("X3", "cekim", json!({"id": 9})))
        .await
        .unwrap();

    assert_eq!(expect_transaction(rx_a.recv().await).data, json!({"id": 9}));
    assert_eq!(expect_transaction(rx_b.recv().await).data, json!({"id": 9}));
}

#[tokio::test]
async fn event_never_leaks_into_other_rooms() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let p1 = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;
    let p2 = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;

    let (a, mut rx_a) = p1.connect_client().await;
    let (b, mut rx_b) = p2.connect_client().await;
    p1.join(&a, "X1", &mut rx_a).await;
    p2.join(&b, "X2", &mut rx_b).await;

    bus.publish(transaction("X1", "yatirim", json!({"n": 1})))
        .await
        .unwrap();

    assert!(matches!(
        rx_a.recv().await,
        Some(ServerMessage::TransactionUpdate(_))
    ));
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn disconnected_subscriber_receives_nothing_further() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let process = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;

    let (a, mut rx_a) = process.connect_client().await;
    process.join(&a, "X4", &mut rx_a).await;
    process.lifecycle.disconnect(&a).await;

    bus.publish(transaction("X4", "teslimat", json!({})))
        .await
        .unwrap();

    // Membership went with the connection; the room is empty again.
    assert!(process
        .registry
        .members_of(&RoomId::new("X4").unwrap())
        .await
        .is_empty());
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn chat_is_scoped_to_the_room_fleet_wide() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let p1 = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;
    let p2 = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;

    let (a, mut rx_a) = p1.connect_client().await;
    let (b, mut rx_b) = p2.connect_client().await;
    let (c, mut rx_c) = p2.connect_client().await;
    p1.join(&a, "X1", &mut rx_a).await;
    p2.join(&b, "X1", &mut rx_b).await;
    p2.join(&c, "X9", &mut rx_c).await;

    p1.lifecycle
        .chat(&a, Some("X1".to_string()), json!("merhaba"))
        .await
        .unwrap();

    match rx_b.recv().await {
        Some(ServerMessage::NewMessage(msg)) => {
            assert_eq!(msg.sender, a.to_string());
            assert_eq!(msg.message, json!("merhaba"));
        }
        other => panic!("expected new-message, got {:?}", other),
    }
    assert!(rx_c.try_recv().is_err());
}

#[tokio::test]
async fn fixed_profile_fleet_sees_joins() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let room = RoomId::new("DKR0OVSSVJ").unwrap();
    let p1 = RelayProcess::start(&bus, RoomPolicy::Fixed(room.clone())).await;
    let p2 = RelayProcess::start(&bus, RoomPolicy::Fixed(room)).await;

    let (_a, mut rx_a) = p1.connect_client().await;
    assert!(matches!(rx_a.recv().await, Some(ServerMessage::RoomJoined(_))));
    assert!(matches!(rx_a.recv().await, Some(ServerMessage::UserJoined(_))));

    // A second connection on the other process; the first sees its join.
    let (b, mut rx_b) = p2.connect_client().await;
    assert!(matches!(rx_b.recv().await, Some(ServerMessage::RoomJoined(_))));

    match rx_a.recv().await {
        Some(ServerMessage::UserJoined(msg)) => {
            assert_eq!(msg.connection_id, b.to_string());
        }
        other => panic!("expected user-joined, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_channel_still_serves_local_traffic() {
    // A relay process whose Redis is down at startup: joins, leaves and
    // local delivery keep working in single-instance mode.
    let registry = Arc::new(RoomRegistry::new());
    let relay = Arc::new(RoomRelay::new(registry.clone()));
    let config = RedisConfig {
        url: "redis://127.0.0.1:1/".to_string(),
        ..Default::default()
    };
    let fanout = RedisFanout::new(&config, relay.clone()).unwrap();
    fanout.spawn();

    let lifecycle = Arc::new(ConnectionLifecycle::new(
        registry.clone(),
        relay,
        fanout.clone() as Arc<dyn FanoutPublisher>,
        RoomPolicy::Dynamic,
    ));

    let (a, mut rx_a) = lifecycle.connect().await;
    assert!(matches!(rx_a.recv().await, Some(ServerMessage::Connected(_))));
    lifecycle.join(&a, "X1").await.unwrap();
    assert!(matches!(rx_a.recv().await, Some(ServerMessage::RoomJoined(_))));

    fanout
        .publish(transaction("X1", "teslimat", json!({"amount": 3})))
        .await
        .unwrap();

    let update = expect_transaction(rx_a.recv().await);
    assert_eq!(update.data, json!({"amount": 3}));

    lifecycle.leave(&a, "X1").await.unwrap();
    assert!(matches!(rx_a.recv().await, Some(ServerMessage::RoomLeft(_))));
}

#[tokio::test]
async fn events_submitted_in_order_arrive_in_order() {
    let bus = Arc::new(InMemoryFanoutBus::new());
    let process = RelayProcess::start(&bus, RoomPolicy::Dynamic).await;

    let (a, mut rx_a) = process.connect_client().await;
    process.join(&a, "X1", &mut rx_a).await;

    for n in 0..10 {
        bus.publish(transaction("X1", "teslimat", json!({"seq": n})))
            .await
            .unwrap();
    }

    for n in 0..10 {
        assert_eq!(
            expect_transaction(rx_a.recv().await).data,
            json!({"seq": n})
        );
    }
}
