//! Event envelope for inbound frames.
//!
//! The real-time API defines dozens of event shapes, so [`Event`] does not try
//! to model them. It keeps the decoded JSON object as-is and exposes typed
//! accessors for the handful of keys the routing engine relies on:
//!
//! | Key | Accessor | Present on |
//! |-----|----------|------------|
//! | `type` | [`Event::event_type`] | almost every event |
//! | `subtype` | [`Event::subtype`] | some message events |
//! | `text` | [`Event::text`] | chat messages |
//! | `user` | [`Event::user`] | chat messages |
//! | `channel` | [`Event::channel`] | chat messages |
//! | `ts` | [`Event::ts`] | chat messages |
//! | `url` | [`Event::url`] | `reconnect_url` |
//!
//! Every accessor returns `None` when the key is missing or holds a
//! non-string value. Anything else is reachable through [`Event::get`].
//!
//! ```rust,ignore
//! let event: Event = r#"{"type":"message","text":"hi","channel":"C1"}"#.parse()?;
//! assert_eq!(event.event_type(), Some("message"));
//! assert_eq!(event.get("channel"), Some(&json!("C1")));
//! ```

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::DecodeError;

/// Event type carrying the replacement endpoint for a future reconnect.
pub const RECONNECT_URL: &str = "reconnect_url";

/// Event type announcing that the team is migrating to another server.
pub const TEAM_MIGRATION_STARTED: &str = "team_migration_started";

/// Event type of chat messages.
pub const MESSAGE: &str = "message";

/// The decoded form of one inbound frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    payload: Map<String, Value>,
}

impl Event {
    /// Wraps an already decoded JSON object.
    pub fn new(payload: Map<String, Value>) -> Self {
        Self { payload }
    }

    /// Decodes an event from raw frame bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::try_from(value)
    }

    /// The `type` field.
    pub fn event_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    /// The `subtype` field.
    pub fn subtype(&self) -> Option<&str> {
        self.str_field("subtype")
    }

    /// The `text` field of chat messages.
    pub fn text(&self) -> Option<&str> {
        self.str_field("text")
    }

    /// The id of the user who produced the event.
    pub fn user(&self) -> Option<&str> {
        self.str_field("user")
    }

    /// The channel the event happened in.
    pub fn channel(&self) -> Option<&str> {
        self.str_field("channel")
    }

    /// The message timestamp, which doubles as the message id upstream.
    pub fn ts(&self) -> Option<&str> {
        self.str_field("ts")
    }

    /// The endpoint carried by `reconnect_url` events.
    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    /// Returns `true` if the `type` field equals `event_type`.
    pub fn is(&self, event_type: &str) -> bool {
        self.event_type() == Some(event_type)
    }

    /// Raw access to any key of the payload.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// The full decoded object.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Consumes the event and returns the decoded object.
    pub fn into_payload(self) -> Map<String, Value> {
        self.payload
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

impl TryFrom<Value> for Event {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(payload) => Ok(Self { payload }),
            Value::Null => Err(DecodeError::NotAnObject("null")),
            Value::Bool(_) => Err(DecodeError::NotAnObject("a boolean")),
            Value::Number(_) => Err(DecodeError::NotAnObject("a number")),
            Value::String(_) => Err(DecodeError::NotAnObject("a string")),
            Value::Array(_) => Err(DecodeError::NotAnObject("an array")),
        }
    }
}

impl FromStr for Event {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::new)
    }
}
