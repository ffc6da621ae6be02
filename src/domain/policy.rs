//! Room membership policy.
//!
//! Deployment profiles differ in which rooms a connection may join. The
//! configuration is resolved once at startup into a single policy value so
//! the lifecycle manager runs one code path regardless of profile.

use thiserror::Error;

use super::foundation::RoomId;

/// Which rooms connections may join, resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPolicy {
    /// Any room a client names may be joined.
    Dynamic,
    /// Every connection is auto-joined to this room; explicit joins to
    /// other rooms are rejected.
    Fixed(RoomId),
    /// Only the listed rooms may be joined, each by explicit request.
    Allowlist(Vec<RoomId>),
}

/// A join request rejected by the active policy.
#[derive(Debug, Clone, Error)]
pub enum PolicyViolation {
    #[error("Room '{room}' is not available on this deployment")]
    RoomNotAllowed { room: String },
}

impl RoomPolicy {
    /// Checks whether the policy permits joining the given room.
    pub fn authorize(&self, room: &RoomId) -> Result<(), PolicyViolation> {
        let allowed = match self {
            RoomPolicy::Dynamic => true,
            RoomPolicy::Fixed(fixed) => fixed == room,
            RoomPolicy::Allowlist(rooms) => rooms.contains(room),
        };
        if allowed {
            Ok(())
        } else {
            Err(PolicyViolation::RoomNotAllowed {
                room: room.to_string(),
            })
        }
    }

    /// The room every new connection is joined to, if the profile has one.
    pub fn auto_join_room(&self) -> Option<&RoomId> {
        match self {
            RoomPolicy::Fixed(room) => Some(room),
            _ => None,
        }
    }
}
