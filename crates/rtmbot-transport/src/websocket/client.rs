//! WebSocket client connection.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use rtmbot_core::{
    BoxedConnection, Connection, Connector, Frame, MessageSink, OutgoingMessage, TransportError,
    TransportResult,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials WebSocket endpoints (`ws://` and `wss://`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Creates a new WebSocket connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> TransportResult<BoxedConnection> {
        info!(url = %url, "Connecting to WebSocket server");

        let (stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::ConnectionFailed {
                    url: url.to_string(),
                    reason: format!("WebSocket connection failed: {}", e),
                })?;

        info!(url = %url, "WebSocket client connected");
        Ok(Box::new(WsConnection::new(url, stream)))
    }
}

/// An established WebSocket connection.
///
/// Pings are answered with a pong before being surfaced as [`Frame::Ping`].
pub struct WsConnection {
    url: String,
    stream: WsStream,
}

impl WsConnection {
    fn new(url: &str, stream: WsStream) -> Self {
        Self {
            url: url.to_string(),
            stream,
        }
    }

    /// The URL this connection was opened to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MessageSink for WsConnection {
    async fn send(&mut self, message: &OutgoingMessage) -> TransportResult<()> {
        trace!(url = %self.url, id = %message.id(), "Sending message");
        self.stream
            .send(Message::text(message.to_json()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<TransportResult<Frame>> {
        loop {
            let frame = match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    trace!(url = %self.url, len = text.len(), "Received text");
                    Frame::Text(text.to_string())
                }
                Ok(Message::Binary(data)) => {
                    trace!(url = %self.url, len = data.len(), "Received binary");
                    Frame::Binary(data.to_vec())
                }
                Ok(Message::Ping(data)) => {
                    trace!(url = %self.url, "Received ping, sending pong");
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        warn!(url = %self.url, error = %e, "Failed to send pong");
                    }
                    Frame::Ping
                }
                Ok(Message::Pong(_)) => {
                    trace!(url = %self.url, "Received pong");
                    Frame::Pong
                }
                Ok(Message::Close(frame)) => {
                    info!(url = %self.url, "Server closed connection");
                    Frame::Close(frame.map(|f| f.reason.to_string()))
                }
                // Raw frames are only produced when writing.
                Ok(Message::Frame(_)) => continue,
                Err(e) => {
                    warn!(url = %self.url, error = %e, "WebSocket error");
                    return Some(Err(TransportError::ReadFailed(e.to_string())));
                }
            };
            return Some(Ok(frame));
        }
    }

    async fn close(&mut self) {
        debug!(url = %self.url, "Closing WebSocket connection");
        if let Err(e) = self.stream.close(None).await {
            debug!(url = %self.url, error = %e, "Error while closing connection");
        }
    }
}
