//! Fan-out adapters implementing the `FanoutPublisher` port.
//!
//! - [`redis`] - shared Redis pub/sub channel for fleet deployments
//! - [`in_memory`] - in-process bus for tests and single-process use

pub mod in_memory;
pub mod redis;

pub use in_memory::InMemoryFanoutBus;
pub use redis::RedisFanout;
