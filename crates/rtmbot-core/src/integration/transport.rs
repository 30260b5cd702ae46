//! Transport seam for the persistent connection.
//!
//! The connection manager is written against these traits so that it can be
//! driven by the WebSocket implementation in `rtmbot-transport` or by an
//! in-memory fake in tests.
//!
//! ```text
//! ┌──────────────┐  connect(url)  ┌──────────────┐
//! │  Connection  │───────────────▶│  Connector   │
//! │   Manager    │◀───────────────│  (ws, fake)  │
//! └──────────────┘ BoxedConnection└──────────────┘
//!        │ next_frame() / send() / close()
//!        ▼
//! ┌──────────────┐
//! │  Connection  │
//! └──────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::error::TransportResult;
use crate::foundation::message::OutgoingMessage;

/// One frame read from the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame; carries JSON events.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Ping control frame.
    Ping,
    /// Pong control frame.
    Pong,
    /// The peer started the closing handshake.
    Close(Option<String>),
}

/// Destination for outgoing chat messages.
#[async_trait]
pub trait MessageSink: Send {
    /// Writes one message.
    async fn send(&mut self, message: &OutgoingMessage) -> TransportResult<()>;
}

/// An established bidirectional connection.
///
/// Only one task reads and one task writes at a time; the connection manager
/// does both from its own loop.
#[async_trait]
pub trait Connection: MessageSink {
    /// Reads the next frame.
    ///
    /// Returns `None` once the stream has ended.
    async fn next_frame(&mut self) -> Option<TransportResult<Frame>>;

    /// Closes the connection. Errors are ignored.
    async fn close(&mut self);
}

/// Owned connection trait object.
pub type BoxedConnection = Box<dyn Connection>;

/// Dials endpoints.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection to `url`.
    async fn connect(&self, url: &str) -> TransportResult<BoxedConnection>;
}

/// Shared connector.
pub type BoxedConnector = Arc<dyn Connector>;

#[async_trait]
impl MessageSink for Vec<OutgoingMessage> {
    async fn send(&mut self, message: &OutgoingMessage) -> TransportResult<()> {
        self.push(message.clone());
        Ok(())
    }
}
