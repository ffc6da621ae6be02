//! HTTP routes for the producer ingress.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{healthz, publish_kind_transaction, publish_transaction, IngressState};

/// Creates the ingress router with all endpoints.
pub fn ingress_routes(state: IngressState) -> Router {
    Router::new()
        .route("/transactions", post(publish_transaction))
        .route("/transactions/:kind", post(publish_kind_transaction))
        .route("/healthz", get(healthz))
        .with_state(state)
}
