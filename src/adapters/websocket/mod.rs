//! WebSocket adapters: the relay core and its transport.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Fan-out channel                          │
//! │   RedisFanout (fleet) │ InMemoryFanoutBus (single process)  │
//! └─────────────────────────────────────────────────────────────┘
//!                             │ deliver_local on receipt
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RoomRelay                            │
//! │   resolves local members, pushes to delivery channels       │
//! └─────────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RoomRegistry                           │
//! │   Room: X1             Room: X2            Room: X3         │
//! │   ├── conn-a           ├── conn-c          └── conn-e       │
//! │   └── conn-b           └── conn-d                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - Client-facing WebSocket protocol types
//! - [`registry`] - Room-scoped connection registry
//! - [`relay`] - Local delivery of relay messages
//! - [`lifecycle`] - Connect / join / leave / disconnect transitions
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod lifecycle;
pub mod messages;
pub mod registry;
pub mod relay;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use lifecycle::{ChatError, ConnectionLifecycle, JoinError};
pub use messages::{ClientMessage, ServerMessage};
pub use registry::{JoinOutcome, RoomRegistry};
pub use relay::{DeliveryOutcome, RoomRelay};
