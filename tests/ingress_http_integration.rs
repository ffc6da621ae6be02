//! Integration tests for the producer ingress HTTP layer.
//!
//! These tests verify the ingress wiring end to end: a producer request
//! accepted by the HTTP handler flows through the fan-out bus into local
//! delivery, and invalid requests are answered with the structured
//! failure envelope without touching the relay.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use roomcast::adapters::fanout::InMemoryFanoutBus;
use roomcast::adapters::http::ingress::{
    publish_kind_transaction, publish_transaction, IngressState, LegacyTransactionRequest,
    PublishTransactionRequest,
};
use roomcast::adapters::websocket::{ConnectionLifecycle, RoomRegistry, RoomRelay, ServerMessage};
use roomcast::domain::policy::RoomPolicy;
use roomcast::ports::FanoutPublisher;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestStack {
    state: IngressState,
    lifecycle: Arc<ConnectionLifecycle>,
    bus: Arc<InMemoryFanoutBus>,
}

/// One process wired the way `main` wires it: the bus feeds the relay,
/// the ingress state shares the bus and registry.
async fn stack() -> TestStack {
    let registry = Arc::new(RoomRegistry::new());
    let relay = Arc::new(RoomRelay::new(registry.clone()));
    let bus = Arc::new(InMemoryFanoutBus::new());
    bus.attach(relay.clone()).await;
    let lifecycle = Arc::new(ConnectionLifecycle::new(
        registry.clone(),
        relay,
        bus.clone() as Arc<dyn FanoutPublisher>,
        RoomPolicy::Dynamic,
    ));
    TestStack {
        state: IngressState::new(bus.clone(), registry),
        lifecycle,
        bus,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(room: &str, kind: &str, payload: Value) -> PublishTransactionRequest {
    PublishTransactionRequest {
        room: Some(room.to_string()),
        event_kind: Some(kind.to_string()),
        payload: Some(payload),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn accepted_event_reaches_room_subscriber() {
    let stack = stack().await;

    let (a, mut rx) = stack.lifecycle.connect().await;
    rx.recv().await; // connected
    stack.lifecycle.join(&a, "X1").await.unwrap();
    rx.recv().await; // room-joined

    let response = publish_transaction(
        State(stack.state.clone()),
        Json(request("X1", "teslimat", json!({"amount": 100}))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    match rx.recv().await {
        Some(ServerMessage::TransactionUpdate(update)) => {
            assert_eq!(update.event_kind, "teslimat");
            assert_eq!(update.data, json!({"amount": 100}));
        }
        other => panic!("expected transaction-update, got {:?}", other),
    }
}

#[tokio::test]
async fn producer_gets_success_with_no_subscribers() {
    let stack = stack().await;

    let response = publish_transaction(
        State(stack.state.clone()),
        Json(request("X2", "teslimat", json!({"amount": 1}))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(stack.bus.message_count(), 1);
}

#[tokio::test]
async fn validation_failures_never_reach_the_bus() {
    let stack = stack().await;

    let missing_room = publish_transaction(
        State(stack.state.clone()),
        Json(PublishTransactionRequest {
            room: None,
            event_kind: Some("teslimat".to_string()),
            payload: Some(json!({})),
        }),
    )
    .await;
    assert_eq!(missing_room.status(), StatusCode::BAD_REQUEST);

    let bad_payload = publish_transaction(
        State(stack.state.clone()),
        Json(request("X1", "teslimat", json!("scalar"))),
    )
    .await;
    assert_eq!(bad_payload.status(), StatusCode::BAD_REQUEST);

    let blank_kind = publish_transaction(
        State(stack.state.clone()),
        Json(PublishTransactionRequest {
            room: Some("X1".to_string()),
            event_kind: Some("  ".to_string()),
            payload: Some(json!({})),
        }),
    )
    .await;
    assert_eq!(blank_kind.status(), StatusCode::BAD_REQUEST);

    assert_eq!(stack.bus.message_count(), 0);
}

#[tokio::test]
async fn legacy_kind_route_flows_into_delivery() {
    let stack = stack().await;

    let (a, mut rx) = stack.lifecycle.connect().await;
    rx.recv().await; // connected
    stack.lifecycle.join(&a, "X7").await.unwrap();
    rx.recv().await; // room-joined

    let response = publish_kind_transaction(
        State(stack.state.clone()),
        Path("yatirim".to_string()),
        Json(LegacyTransactionRequest {
            data: Some(json!({"room_code": "X7", "amount": 250})),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["receivedData"]["amount"], json!(250));

    match rx.recv().await {
        Some(ServerMessage::TransactionUpdate(update)) => {
            assert_eq!(update.event_kind, "yatirim");
            assert_eq!(update.data["room_code"], json!("X7"));
        }
        other => panic!("expected transaction-update, got {:?}", other),
    }
}
