//! Runtime error types.

use thiserror::Error;

use rtmbot_core::{ApiError, TransportError};

use crate::config::ConfigError;

/// Errors that can end [`Bot::start`](crate::Bot::start) or bot setup.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The `rtm.start` response did not have the expected shape.
    #[error("{0}")]
    Handshake(String),

    /// A remote method call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The connection failed or was closed by the peer.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A migration was announced but no reconnect URL had been received.
    #[error("Migration requested but no reconnect URL is known")]
    NoReconnectUrl,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A plugin failed to load.
    #[error("Plugin '{name}' failed to load: {reason}")]
    Plugin {
        /// Plugin name.
        name: String,
        /// Failure description.
        reason: String,
    },
}

impl RuntimeError {
    /// The error returned when the handshake response is unusable.
    pub fn handshake() -> Self {
        Self::Handshake("could not connect to RTM API".to_string())
    }

    /// Creates a plugin load error.
    pub fn plugin(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Plugin {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
