//! HTTP DTOs for the producer ingress endpoints.
//!
//! Fields arrive optional so a missing value gets the structured
//! `{success: false, message}` reply instead of a bare deserialization
//! failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Canonical producer request: `POST /transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishTransactionRequest {
    pub room: Option<String>,
    #[serde(rename = "eventKind")]
    pub event_kind: Option<String>,
    pub payload: Option<Value>,
}

/// Legacy producer request: `POST /transactions/{kind}`.
///
/// The original integrations post `{ "data": { "room_code": ..., ... } }`
/// per transaction kind; the whole `data` object is the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyTransactionRequest {
    pub data: Option<Value>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Producer-facing result envelope.
///
/// `success: true` means "accepted into the relay"; whether anyone was
/// subscribed to the room is deliberately not part of the contract.
#[derive(Debug, Clone, Serialize)]
pub struct IngressResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "receivedData", skip_serializing_if = "Option::is_none")]
    pub received_data: Option<Value>,
}

impl IngressResponse {
    /// An accepted event, echoing the payload back to the producer.
    pub fn accepted(kind: &str, received_data: Value) -> Self {
        Self {
            success: true,
            message: format!("{} event accepted", kind),
            received_data: Some(received_data),
        }
    }

    /// A rejected request.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            received_data: None,
        }
    }
}

/// Reply for `GET /healthz`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub fanout: String,
    pub connections: usize,
}
