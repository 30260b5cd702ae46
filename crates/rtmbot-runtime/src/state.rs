//! Connection state owned by one run of the connection manager.

use tracing::debug;

/// Lifecycle phase of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing dialed yet.
    Disconnected,
    /// Dialing the current target.
    Connecting,
    /// Reading frames.
    Connected,
    /// A migration was announced; the old connection is being replaced.
    Reconnecting,
    /// The run is over.
    Closed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Phase, dial target and the last reconnect URL announced by the server.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    phase: Phase,
    target: String,
    reconnect_url: Option<String>,
    connections: u32,
}

impl ConnectionState {
    /// Creates the state for a run that will first dial `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            phase: Phase::Disconnected,
            target: target.into(),
            reconnect_url: None,
            connections: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The endpoint the next dial goes to.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn reconnect_url(&self) -> Option<&str> {
        self.reconnect_url.as_deref()
    }

    /// Number of connections established so far.
    pub fn connections(&self) -> u32 {
        self.connections
    }

    /// Moves to `phase`.
    pub fn transition(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, target = %self.target, "Connection state change");
        if phase == Phase::Connected {
            self.connections += 1;
        }
        self.phase = phase;
    }

    /// Stores the latest reconnect URL; later announcements replace earlier ones.
    pub fn remember_reconnect_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        debug!(url = %url, "Stored reconnect URL");
        self.reconnect_url = Some(url);
    }

    /// Points the next dial at the stored reconnect URL.
    ///
    /// Returns `false` if no reconnect URL has been announced.
    pub fn retarget(&mut self) -> bool {
        match &self.reconnect_url {
            Some(url) => {
                self.target.clone_from(url);
                true
            }
            None => false,
        }
    }
}
