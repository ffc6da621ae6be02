//! Adapters - Implementations of ports and transport glue.

pub mod fanout;
pub mod http;
pub mod websocket;

pub use fanout::{InMemoryFanoutBus, RedisFanout};
pub use websocket::{ConnectionLifecycle, RoomRegistry, RoomRelay};
