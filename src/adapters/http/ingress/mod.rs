//! Producer ingress adapter.
//!
//! Normalizes inbound producer requests into the canonical transaction
//! event shape and hands them to the fan-out publish path. The producer
//! contract is acceptance: a valid event gets `success: true` whether or
//! not any subscriber exists anywhere in the fleet.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    HealthResponse, IngressResponse, LegacyTransactionRequest, PublishTransactionRequest,
};
pub use handlers::{healthz, publish_kind_transaction, publish_transaction, IngressState};
pub use routes::ingress_routes;
