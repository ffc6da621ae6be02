//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay core and the outside world. Adapters implement these ports.
//!
//! - `FanoutPublisher` - Cross-process propagation of relay messages

mod fanout;

pub use fanout::{FanoutError, FanoutPublisher, FanoutStatus};
