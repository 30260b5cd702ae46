//! Ready-made handlers for common replies.
//!
//! ```rust,ignore
//! bot.respond("^ping$", respond_with("pong"))?;
//! bot.listen("(?i)ship it", react_with("rocket"))?;
//! ```

use std::future;
use std::sync::Arc;

use tracing::warn;

use rtmbot_core::{BotContext, BoxFuture, Handler, Reply, params};

/// Handler that answers with a mention of the message author.
///
/// See [`respond_with`].
#[derive(Debug, Clone)]
pub struct RespondWith {
    text: String,
}

/// Replies `<@user>: text` in the channel the event came from.
///
/// Events without a `user` or `channel` get no reply.
pub fn respond_with(text: impl Into<String>) -> RespondWith {
    RespondWith { text: text.into() }
}

impl Handler for RespondWith {
    fn call(&self, ctx: Arc<BotContext>) -> BoxFuture<'static, Reply> {
        let event = ctx.event();
        let reply = match (event.user(), event.channel()) {
            (Some(user), Some(channel)) => {
                Reply::send(ctx.session().mention(user, &self.text, channel))
            }
            _ => Reply::none(),
        };
        Box::pin(future::ready(reply))
    }
}

/// Handler that adds an emoji reaction to the triggering message.
///
/// See [`react_with`].
#[derive(Debug, Clone)]
pub struct ReactWith {
    emoji: Arc<str>,
}

/// Reacts to the event's message with `emoji` (without colons, e.g. `"thumbsup"`).
///
/// The reaction goes through the API, not the connection, so the handler
/// itself always replies with [`Reply::none`]. Failures are logged.
pub fn react_with(emoji: impl AsRef<str>) -> ReactWith {
    ReactWith {
        emoji: Arc::from(emoji.as_ref()),
    }
}

impl Handler for ReactWith {
    fn call(&self, ctx: Arc<BotContext>) -> BoxFuture<'static, Reply> {
        let emoji = Arc::clone(&self.emoji);
        Box::pin(async move {
            let event = ctx.event();
            let (Some(channel), Some(ts)) = (event.channel(), event.ts()) else {
                return Reply::none();
            };

            let request = params([("channel", channel), ("timestamp", ts), ("name", &*emoji)]);
            if let Err(e) = ctx.session().call_ok("reactions.add", request).await {
                warn!(emoji = %emoji, channel = %channel, error = %e, "Failed to add reaction");
            }
            Reply::none()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rtmbot_core::{ApiCaller, ApiResult, Event, Identity, Params, Session};
    use serde_json::{Value, json};

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<(String, Params)>>,
    }

    #[async_trait]
    impl ApiCaller for RecordingApi {
        async fn call(&self, method: &str, params: Params) -> ApiResult<Value> {
            self.calls.lock().push((method.to_string(), params));
            Ok(json!({"ok": true}))
        }
    }

    fn ctx(api: Arc<RecordingApi>, event: Value) -> Arc<BotContext> {
        let session = Arc::new(Session::new(Identity::new("bot", "UBOT"), api));
        Arc::new(BotContext::new(session, Event::try_from(event).unwrap()))
    }

    #[tokio::test]
    async fn test_respond_with_mentions_author() {
        let api = Arc::new(RecordingApi::default());
        let handler = respond_with("pong");

        let reply = handler
            .call(ctx(
                api,
                json!({"type": "message", "user": "U1", "channel": "C1", "text": "bot: ping"}),
            ))
            .await;

        let message = reply.message.unwrap();
        assert_eq!(message.text(), "<@U1>: pong");
        assert_eq!(message.channel(), "C1");
    }

    #[tokio::test]
    async fn test_respond_with_needs_user_and_channel() {
        let api = Arc::new(RecordingApi::default());
        let reply = respond_with("pong")
            .call(ctx(api, json!({"type": "message", "channel": "C1"})))
            .await;
        assert_eq!(reply, Reply::none());
    }

    #[tokio::test]
    async fn test_react_with_calls_reactions_add() {
        let api = Arc::new(RecordingApi::default());
        let reply = react_with("rocket")
            .call(ctx(
                Arc::clone(&api),
                json!({"type": "message", "channel": "C1", "ts": "1700000000.000100"}),
            ))
            .await;

        assert_eq!(reply, Reply::none());
        let calls = api.calls.lock();
        assert_eq!(calls.len(), 1);
        let (method, params) = &calls[0];
        assert_eq!(method, "reactions.add");
        assert_eq!(params["channel"], "C1");
        assert_eq!(params["timestamp"], "1700000000.000100");
        assert_eq!(params["name"], "rocket");
    }

    #[tokio::test]
    async fn test_react_with_skips_events_without_ts() {
        let api = Arc::new(RecordingApi::default());
        react_with("rocket")
            .call(ctx(Arc::clone(&api), json!({"type": "message", "channel": "C1"})))
            .await;
        assert!(api.calls.lock().is_empty());
    }
}
