//! Bot identity and the session shared with handlers.

use std::fmt;

use regex::Regex;
use serde_json::Value;
use tracing::error;

use crate::foundation::error::{ApiError, ApiResult};
use crate::foundation::message::OutgoingMessage;
use crate::integration::api::{ApiCaller, BoxedApiCaller, Params, ensure_ok, params};

/// The authenticated identity of the bot.
///
/// Also owns the matcher that recognises a mention of the bot at the start of
/// a message: either `name` or `<@id>`, optionally followed by `:`, followed
/// by a space.
#[derive(Clone)]
pub struct Identity {
    name: String,
    id: String,
    by_name: Regex,
    by_id: Regex,
}

impl Identity {
    /// Creates an identity for the bot called `name` with user id `id`.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        let name = name.into();
        let id = id.into();
        let by_name = mention_regex(&regex::escape(&name));
        let by_id = mention_regex(&format!("<@{}>", regex::escape(&id)));
        Self {
            name,
            id,
            by_name,
            by_id,
        }
    }

    /// The bot's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bot's user id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the text following a leading mention of the bot, if any.
    pub fn strip_mention<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.by_name
            .find(text)
            .or_else(|| self.by_id.find(text))
            .map(|m| &text[m.end()..])
    }
}

fn mention_regex(prefix: &str) -> Regex {
    Regex::new(&format!(r"\A{prefix}:? ")).expect("escaped mention pattern is valid")
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.id == other.id
    }
}

/// State of a connected bot shared with every handler.
///
/// Created by the connection manager once the handshake has identified the
/// bot. Handlers use it to build replies and to make auxiliary API calls.
pub struct Session {
    identity: Identity,
    api: BoxedApiCaller,
}

impl Session {
    /// Creates a session.
    pub fn new(identity: Identity, api: BoxedApiCaller) -> Self {
        Self { identity, api }
    }

    /// The bot's identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The underlying API caller.
    pub fn api(&self) -> &dyn ApiCaller {
        self.api.as_ref()
    }

    /// Calls a remote method.
    pub async fn call(&self, method: &str, params: Params) -> ApiResult<Value> {
        self.api.call(method, params).await
    }

    /// Calls a remote method and fails unless the response reports `ok: true`.
    pub async fn call_ok(&self, method: &str, params: Params) -> ApiResult<Value> {
        let payload = self.api.call(method, params).await?;
        ensure_ok(method, payload)
    }

    /// Builds a message that mentions `user` with `text` in `channel`.
    pub fn mention(&self, user: &str, text: &str, channel: &str) -> OutgoingMessage {
        OutgoingMessage::new(format!("<@{user}>: {text}"), channel)
    }

    /// Opens (or reuses) a direct message channel with `user` and returns its id.
    pub async fn open_direct_message(&self, user: &str) -> ApiResult<String> {
        let payload = self
            .call_ok("im.open", params([("user", user)]))
            .await
            .inspect_err(|e| error!(user = %user, error = %e, "Failed to open direct message"))?;

        payload
            .get("channel")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("im.open response has no channel id".into()))
    }

    /// Builds a message sent to `user` over a direct message channel.
    ///
    /// Returns `None` if the channel could not be opened.
    pub async fn direct_message(&self, user: &str, text: &str) -> Option<OutgoingMessage> {
        let channel = self.open_direct_message(user).await.ok()?;
        Some(OutgoingMessage::new(text, channel))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_strip_mention_by_name() {
        let identity = Identity::new("bot", "U123");
        assert_eq!(identity.strip_mention("bot: hi"), Some("hi"));
        assert_eq!(identity.strip_mention("bot hi"), Some("hi"));
        assert_eq!(identity.strip_mention("bothead: hi"), None);
        assert_eq!(identity.strip_mention("hey bot: hi"), None);
        assert_eq!(identity.strip_mention("bot:hi"), None);
    }

    #[test]
    fn test_strip_mention_by_id() {
        let identity = Identity::new("bot", "U123");
        assert_eq!(identity.strip_mention("<@U123>: deploy"), Some("deploy"));
        assert_eq!(identity.strip_mention("<@U123> deploy"), Some("deploy"));
        assert_eq!(identity.strip_mention("<@U999>: deploy"), None);
    }

    #[test]
    fn test_name_is_matched_literally() {
        let identity = Identity::new("b.t", "U1");
        assert_eq!(identity.strip_mention("bot: hi"), None);
        assert_eq!(identity.strip_mention("b.t: hi"), Some("hi"));
    }

    struct ImOpen;

    #[async_trait]
    impl ApiCaller for ImOpen {
        async fn call(&self, method: &str, params: Params) -> ApiResult<Value> {
            assert_eq!(method, "im.open");
            match params.get("user").map(String::as_str) {
                Some("U1") => Ok(json!({"ok": true, "channel": {"id": "D1"}})),
                _ => Ok(json!({"ok": false, "error": "user_not_found"})),
            }
        }
    }

    fn session() -> Session {
        Session::new(Identity::new("bot", "UBOT"), Arc::new(ImOpen))
    }

    #[tokio::test]
    async fn test_direct_message() {
        let session = session();
        let msg = session.direct_message("U1", "psst").await.unwrap();
        assert_eq!(msg.channel(), "D1");
        assert_eq!(msg.text(), "psst");

        assert!(session.direct_message("U2", "psst").await.is_none());
        assert!(matches!(
            session.open_direct_message("U2").await,
            Err(ApiError::Remote { .. })
        ));
    }

    #[test]
    fn test_mention_message() {
        let msg = session().mention("U7", "done", "C1");
        assert_eq!(msg.text(), "<@U7>: done");
        assert_eq!(msg.channel(), "C1");
    }
}
