//! HTTP adapters.

pub mod ingress;

pub use ingress::{ingress_routes, IngressState};
