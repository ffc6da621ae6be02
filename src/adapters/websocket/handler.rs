//! WebSocket upgrade handler for client connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection
//! lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Register the connection (auto-joining under fixed-room profiles)
//! 3. Relay messages both ways until disconnect
//! 4. Clean up room membership exactly once

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use super::{lifecycle::ConnectionLifecycle, messages::ClientMessage};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub lifecycle: Arc<ConnectionLifecycle>,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(lifecycle: Arc<ConnectionLifecycle>) -> Self {
        Self { lifecycle }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection: one task drains the
/// connection's delivery channel into the socket, the other parses client
/// commands. Whichever path notices the transport closing first triggers
/// disconnect; the lifecycle manager guards against double cleanup.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();

    let (connection_id, mut outbound) = state.lifecycle.connect().await;

    // Forward delivery-channel messages to the client.
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to encode server message: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json)).await {
                tracing::debug!(
                    connection_id = %connection_id,
                    "send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Process commands from the client.
    let lifecycle = state.lifecycle.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(msg) => msg,
                        Err(e) => {
                            tracing::debug!(
                                connection_id = %connection_id,
                                "unparseable client message: {}",
                                e
                            );
                            continue;
                        }
                    };
                    match client_msg {
                        ClientMessage::JoinRoom { room } => {
                            // Rejections are answered on the delivery
                            // channel; nothing to do with the result here.
                            let _ = lifecycle.join(&connection_id, &room).await;
                        }
                        ClientMessage::LeaveRoom { room } => {
                            let _ = lifecycle.leave(&connection_id, &room).await;
                        }
                        ClientMessage::SendMessage { room, message } => {
                            let _ = lifecycle.chat(&connection_id, room, message).await;
                        }
                        ClientMessage::Ping => {
                            lifecycle.pong(&connection_id).await;
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "received unsupported binary message"
                    );
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level frames are handled by axum.
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Whichever task finishes first ends the connection.
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    state.lifecycle.disconnect(&connection_id).await;
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = websocket_router().with_state(ws_state);
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
