//! Room policy configuration
//!
//! Deployments differ in how rooms come into existence: some let clients
//! join any room they name, some pin every connection to one fixed room,
//! and some allow a small fixed set. The mode is resolved once at startup
//! into a [`RoomPolicy`](crate::domain::policy::RoomPolicy).

use serde::Deserialize;

use crate::domain::foundation::RoomId;
use crate::domain::policy::RoomPolicy;

use super::error::ValidationError;

/// Room membership policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoomsConfig {
    /// Membership mode
    #[serde(default)]
    pub mode: RoomMode,

    /// Room list for `fixed`/`allowlist` modes (comma-separated)
    pub rooms: Option<String>,

    /// Deliver events addressed to rooms with zero local members instead
    /// of dropping them
    #[serde(default)]
    pub deliver_to_empty: bool,
}

/// How room membership is granted
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    /// Clients may join any room they name
    #[default]
    Dynamic,
    /// Every connection is auto-joined to the single configured room
    Fixed,
    /// Clients may only join rooms from the configured list
    Allowlist,
}

impl RoomsConfig {
    /// Get the configured room list as a vector
    pub fn rooms_list(&self) -> Vec<String> {
        self.rooms
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate room policy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let rooms = self.rooms_list();
        match self.mode {
            RoomMode::Dynamic if !rooms.is_empty() => {
                Err(ValidationError::DynamicModeForbidsRooms)
            }
            RoomMode::Fixed if rooms.len() != 1 => Err(ValidationError::FixedModeRequiresOneRoom),
            RoomMode::Allowlist if rooms.is_empty() => {
                Err(ValidationError::AllowlistRequiresRooms)
            }
            _ => Ok(()),
        }
    }

    /// Resolve the configuration into a single policy value.
    ///
    /// Call after [`validate`](Self::validate); room names are checked again
    /// here so the conversion is total on its own.
    pub fn policy(&self) -> Result<RoomPolicy, ValidationError> {
        self.validate()?;
        let mut rooms = Vec::new();
        for name in self.rooms_list() {
            rooms.push(RoomId::new(name).map_err(|_| ValidationError::EmptyRoomName)?);
        }
        let policy = match self.mode {
            RoomMode::Dynamic => RoomPolicy::Dynamic,
            RoomMode::Fixed => RoomPolicy::Fixed(rooms.remove(0)),
            RoomMode::Allowlist => RoomPolicy::Allowlist(rooms),
        };
        Ok(policy)
    }
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            mode: RoomMode::Dynamic,
            rooms: None,
            deliver_to_empty: false,
        }
    }
}
