//! Connection lifecycle state.

use super::foundation::StateMachine;

/// Lifecycle state of one client connection.
///
/// A connection is `Connected` from the moment its transport is
/// established; membership changes (join/leave) do not change the state.
/// `Disconnected` is terminal; cleanup runs exactly once on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (ConnectionState::Connected, ConnectionState::Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ConnectionState::Connected => vec![ConnectionState::Disconnected],
            ConnectionState::Disconnected => vec![],
        }
    }
}
