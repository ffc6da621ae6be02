//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Fan-out channel name cannot be empty")]
    EmptyChannelName,

    #[error("Backoff base exceeds backoff cap")]
    InvalidBackoff,

    #[error("Room mode 'fixed' requires exactly one room")]
    FixedModeRequiresOneRoom,

    #[error("Room mode 'allowlist' requires at least one room")]
    AllowlistRequiresRooms,

    #[error("Room mode 'dynamic' does not take a room list")]
    DynamicModeForbidsRooms,

    #[error("Configured room name cannot be empty")]
    EmptyRoomName,
}
