//! Outgoing messages and handler replies.
//!
//! Handlers never write to the connection themselves. They return a [`Reply`]
//! describing an optional [`OutgoingMessage`] and a [`Status`], and the
//! response coordinator turns the replies of one dispatch into writes.

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

/// The message-kind tag carried by every outgoing chat message.
pub const MESSAGE_KIND: &str = "message";

/// One chat message to send over the connection.
///
/// Serializes to a flat object with exactly four keys:
///
/// ```json
/// {"id": "101826153045", "type": "message", "channel": "C024BE91L", "text": "hi"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    channel: String,
    text: String,
}

impl OutgoingMessage {
    /// Creates a message that sends `text` to `channel`.
    ///
    /// The id is derived from the current local time with one-second
    /// resolution, so two messages built within the same second share an id.
    ///
    /// `time` refuses to read the local offset on Unix once the process has
    /// more than one thread (any multi-threaded tokio runtime), and the id
    /// then uses UTC instead.
    pub fn new(text: impl Into<String>, channel: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::at(now, text, channel)
    }

    /// Creates a message whose id is derived from `sent_at`.
    pub fn at(sent_at: OffsetDateTime, text: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            id: format_id(sent_at),
            kind: MESSAGE_KIND,
            channel: channel.into(),
            text: text.into(),
        }
    }

    /// The generated message id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Always [`MESSAGE_KIND`].
    pub fn kind(&self) -> &str {
        self.kind
    }

    /// Destination channel id.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Message body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Encodes the message as a JSON frame.
    pub fn to_json(&self) -> String {
        // A struct of plain strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Formats `MMDDYYhhmmss`.
fn format_id(t: OffsetDateTime) -> String {
    let format = format_description!("[month][day][year repr:last_two][hour][minute][second]");
    t.format(format).unwrap_or_else(|_| t.unix_timestamp().to_string())
}

/// How the connection loop should proceed after a handler ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Keep listening and sending messages.
    #[default]
    Continue,
    /// Send this message and those of the remaining handlers, then stop.
    Shutdown,
    /// Stop immediately; nothing else from this dispatch is sent.
    ShutdownNow,
}

/// The result of running one handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Message to send, if any.
    pub message: Option<OutgoingMessage>,
    /// Loop control signal.
    pub status: Status,
}

impl Reply {
    /// Creates a reply from its parts.
    pub fn new(message: Option<OutgoingMessage>, status: Status) -> Self {
        Self { message, status }
    }

    /// No message, keep looping.
    pub fn none() -> Self {
        Self::default()
    }

    /// Send `message` and keep looping.
    pub fn send(message: OutgoingMessage) -> Self {
        Self::new(Some(message), Status::Continue)
    }

    /// No message, stop after this dispatch.
    pub fn shutdown() -> Self {
        Self::new(None, Status::Shutdown)
    }

    /// No message, stop immediately.
    pub fn shutdown_now() -> Self {
        Self::new(None, Status::ShutdownNow)
    }

    /// Replaces the status, keeping the message.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

impl From<OutgoingMessage> for Reply {
    fn from(message: OutgoingMessage) -> Self {
        Self::send(message)
    }
}

impl From<Option<OutgoingMessage>> for Reply {
    fn from(message: Option<OutgoingMessage>) -> Self {
        Self::new(message, Status::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use time::macros::datetime;

    #[test]
    fn test_id_format() {
        let msg = OutgoingMessage::at(datetime!(2026-10-18 15:30:45 UTC), "hi", "C1");
        assert_eq!(msg.id(), "101826153045");
    }

    #[test]
    fn test_id_shape_with_other_threads_running() {
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let worker = std::thread::spawn(move || {
            let _ = stop_rx.recv();
        });

        let message = OutgoingMessage::new("hi", "C1");
        assert_eq!(message.id().len(), 12);
        assert!(message.id().bytes().all(|b| b.is_ascii_digit()));

        drop(stop_tx);
        worker.join().unwrap();
    }

    #[test]
    fn test_serializes_exactly_four_keys() {
        let msg = OutgoingMessage::at(datetime!(2024-01-02 03:04:05 UTC), "hello", "C42");
        let value: Value = serde_json::from_str(&msg.to_json()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 4);
        assert_eq!(obj["id"], "010224030405");
        assert_eq!(obj["type"], "message");
        assert_eq!(obj["channel"], "C42");
        assert_eq!(obj["text"], "hello");
    }

    #[test]
    fn test_reply_constructors() {
        assert_eq!(Reply::none().status, Status::Continue);
        assert!(Reply::none().message.is_none());
        assert_eq!(Reply::shutdown().status, Status::Shutdown);
        assert_eq!(Reply::shutdown_now().status, Status::ShutdownNow);

        let reply = Reply::send(OutgoingMessage::new("x", "C")).with_status(Status::Shutdown);
        assert_eq!(reply.status, Status::Shutdown);
        assert_eq!(reply.message.unwrap().text(), "x");
    }
}
