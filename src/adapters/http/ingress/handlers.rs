//! HTTP handlers for the producer ingress endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::adapters::websocket::RoomRegistry;
use crate::domain::event::{EventKind, RelayMessage, TransactionEvent};
use crate::domain::foundation::RoomId;
use crate::ports::{FanoutPublisher, FanoutStatus};

use super::dto::{
    HealthResponse, IngressResponse, LegacyTransactionRequest, PublishTransactionRequest,
};

/// State required by the ingress handlers.
#[derive(Clone)]
pub struct IngressState {
    fanout: Arc<dyn FanoutPublisher>,
    registry: Arc<RoomRegistry>,
}

impl IngressState {
    pub fn new(fanout: Arc<dyn FanoutPublisher>, registry: Arc<RoomRegistry>) -> Self {
        Self { fanout, registry }
    }
}

/// POST /transactions - Accept a canonical transaction event
pub async fn publish_transaction(
    State(state): State<IngressState>,
    Json(req): Json<PublishTransactionRequest>,
) -> Response {
    let event = match validate_canonical(req) {
        Ok(event) => event,
        Err(message) => return rejected(message),
    };
    accept(&state, event).await
}

/// POST /transactions/{kind} - Accept a legacy per-kind producer request
///
/// The room rides inside the payload as `room_code`, and the payload is
/// the entire `data` object, exactly as the original producers send it.
pub async fn publish_kind_transaction(
    State(state): State<IngressState>,
    Path(kind): Path<String>,
    Json(req): Json<LegacyTransactionRequest>,
) -> Response {
    let event = match validate_legacy(kind, req) {
        Ok(event) => event,
        Err(message) => return rejected(message),
    };
    accept(&state, event).await
}

/// GET /healthz - Process liveness and fan-out channel status
pub async fn healthz(State(state): State<IngressState>) -> Json<HealthResponse> {
    let fanout = match state.fanout.status() {
        FanoutStatus::Active => "active",
        FanoutStatus::SingleInstance => "single-instance",
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        fanout: fanout.to_string(),
        connections: state.registry.connection_count().await,
    })
}

fn validate_canonical(req: PublishTransactionRequest) -> Result<TransactionEvent, String> {
    let room = req.room.ok_or("room is required")?;
    let room = RoomId::new(room).map_err(|e| e.to_string())?;
    let kind = req.event_kind.ok_or("eventKind is required")?;
    let kind = EventKind::new(kind).map_err(|e| e.to_string())?;
    let payload = req.payload.ok_or("payload is required")?;
    TransactionEvent::new(room, kind, payload).map_err(|e| e.to_string())
}

fn validate_legacy(kind: String, req: LegacyTransactionRequest) -> Result<TransactionEvent, String> {
    let kind = EventKind::new(kind).map_err(|e| e.to_string())?;
    let data = req.data.ok_or("data is required")?;
    if !data.is_object() {
        return Err("data must be a JSON object".to_string());
    }
    let room_code = data
        .get("room_code")
        .and_then(Value::as_str)
        .ok_or("room_code is required")?;
    let room = RoomId::new(room_code).map_err(|e| e.to_string())?;
    TransactionEvent::new(room, kind, data).map_err(|e| e.to_string())
}

/// Hands a validated event to the fan-out publish path.
///
/// Acceptance is the producer contract; whether anyone is subscribed, or
/// whether the fleet channel is up, does not change the reply.
async fn accept(state: &IngressState, event: TransactionEvent) -> Response {
    tracing::info!(room = %event.room, kind = %event.kind, "transaction accepted");
    let kind = event.kind.to_string();
    let received = event.payload.clone();
    if let Err(e) = state
        .fanout
        .publish(RelayMessage::transaction(event))
        .await
    {
        tracing::warn!(error = %e, "fan-out publish failed after accept");
    }
    (StatusCode::OK, Json(IngressResponse::accepted(&kind, received))).into_response()
}

fn rejected(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(IngressResponse::rejected(message)),
    )
        .into_response()
}
