//! Pattern registry.
//!
//! [`PatternHandler`] wraps another handler with a precondition on the text of
//! a chat message. Two flavours exist:
//!
//! - **listen**: the pattern must match anywhere in the text.
//! - **respond**: the text must start with a mention of the bot
//!   (`bot: ...`, `bot ...`, `<@U123>: ...`), and the pattern is tested
//!   against what follows the mention.
//!
//! The registration helpers on [`Dispatcher`] install pattern handlers under
//! the `message` event type, without a subtype constraint:
//!
//! ```rust,ignore
//! dispatcher.listen("(?i)good morning", wave)?;
//! dispatcher.respond(r"^deploy (\w+)$", deploy)?;
//! ```
//!
//! Handlers only receive the original event. `respond` strips the mention to
//! test the pattern, but the delegate still sees the full text.

use std::sync::Arc;

use futures::future;
use regex::Regex;
use tracing::debug;

use crate::foundation::context::BotContext;
use crate::foundation::error::PatternError;
use crate::foundation::event::MESSAGE;
use crate::foundation::message::Reply;
use crate::framework::dispatcher::Dispatcher;
use crate::framework::handler::{BoxFuture, BoxedHandler, Handler, into_handler};

/// A handler guarded by a text pattern.
#[derive(Clone)]
pub struct PatternHandler {
    regex: Regex,
    requires_mention: bool,
    inner: BoxedHandler,
}

impl PatternHandler {
    /// Fires `handler` when `regex` matches anywhere in the message text.
    pub fn listen<H>(regex: Regex, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        Self {
            regex,
            requires_mention: false,
            inner: into_handler(handler),
        }
    }

    /// Fires `handler` when the message mentions the bot and `regex` matches
    /// the text after the mention.
    pub fn respond<H>(regex: Regex, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        Self {
            regex,
            requires_mention: true,
            inner: into_handler(handler),
        }
    }

    /// The pattern tested against the message text.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Whether the message must open with a mention of the bot.
    pub fn requires_mention(&self) -> bool {
        self.requires_mention
    }

    /// Checks the precondition against the event in `ctx`.
    pub fn matches(&self, ctx: &BotContext) -> bool {
        let Some(text) = ctx.event().text() else {
            return false;
        };

        let candidate = if self.requires_mention {
            match ctx.session().identity().strip_mention(text) {
                Some(rest) => rest,
                None => {
                    debug!(text = %text, regex = %self.regex, "NO MENTION. Not invoking handler.");
                    return false;
                }
            }
        } else {
            text
        };

        if self.regex.is_match(candidate) {
            debug!(text = %text, regex = %self.regex, "MATCH. Invoking handler.");
            true
        } else {
            debug!(text = %text, regex = %self.regex, "NO MATCH. Not invoking handler.");
            false
        }
    }
}

impl Handler for PatternHandler {
    fn call(&self, ctx: Arc<BotContext>) -> BoxFuture<'static, Reply> {
        if self.matches(&ctx) {
            self.inner.call(ctx)
        } else {
            Box::pin(future::ready(Reply::none()))
        }
    }
}

impl std::fmt::Debug for PatternHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternHandler")
            .field("regex", &self.regex.as_str())
            .field("requires_mention", &self.requires_mention)
            .finish()
    }
}

// =============================================================================
// Registration helpers
// =============================================================================

impl Dispatcher {
    /// Registers `handler` for chat messages whose text matches `pattern`.
    pub fn listen<H>(&mut self, pattern: &str, handler: H) -> Result<(), PatternError>
    where
        H: Handler + 'static,
    {
        self.listen_regex(Regex::new(pattern)?, handler);
        Ok(())
    }

    /// Same as [`listen`](Self::listen) with a precompiled regex.
    pub fn listen_regex<H>(&mut self, regex: Regex, handler: H)
    where
        H: Handler + 'static,
    {
        self.register(MESSAGE, PatternHandler::listen(regex, handler));
    }

    /// Registers `handler` for chat messages that mention the bot and whose
    /// remaining text matches `pattern`.
    pub fn respond<H>(&mut self, pattern: &str, handler: H) -> Result<(), PatternError>
    where
        H: Handler + 'static,
    {
        self.respond_regex(Regex::new(pattern)?, handler);
        Ok(())
    }

    /// Same as [`respond`](Self::respond) with a precompiled regex.
    pub fn respond_regex<H>(&mut self, regex: Regex, handler: H)
    where
        H: Handler + 'static,
    {
        self.register(MESSAGE, PatternHandler::respond(regex, handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::event::Event;
    use crate::foundation::message::{OutgoingMessage, Status};
    use crate::framework::handler::from_fn;
    use crate::integration::{DisabledApiCaller, Identity, Session};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(value: Value) -> Arc<BotContext> {
        let session = Arc::new(Session::new(
            Identity::new("bot", "UBOT"),
            Arc::new(DisabledApiCaller),
        ));
        Arc::new(BotContext::new(session, Event::try_from(value).unwrap()))
    }

    /// Counts invocations and replies with the text it saw.
    fn counting(counter: &Arc<AtomicUsize>) -> impl Handler + 'static {
        let counter = Arc::clone(counter);
        from_fn(move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Reply::send(OutgoingMessage::new(
                ctx.event().text().unwrap_or_default(),
                "C1",
            ))
            .with_status(Status::Shutdown)
        })
    }

    #[tokio::test]
    async fn test_listen_matches_substring() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = PatternHandler::listen(Regex::new("hello").unwrap(), counting(&counter));

        let reply = handler
            .call(ctx(json!({"type": "message", "text": "hello world"})))
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(reply.status, Status::Shutdown);
        assert_eq!(reply.message.unwrap().text(), "hello world");
    }

    #[tokio::test]
    async fn test_listen_without_text_does_not_delegate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = PatternHandler::listen(Regex::new("hello").unwrap(), counting(&counter));

        let reply = handler.call(ctx(json!({"type": "message"}))).await;

        assert_eq!(reply, Reply::none());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listen_no_match() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = PatternHandler::listen(Regex::new("^hello$").unwrap(), counting(&counter));

        let reply = handler
            .call(ctx(json!({"type": "message", "text": "say hello"})))
            .await;

        assert_eq!(reply, Reply::none());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_respond_requires_mention() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = PatternHandler::respond(Regex::new("hi").unwrap(), counting(&counter));

        let reply = handler
            .call(ctx(json!({"type": "message", "text": "bot: hi"})))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        // The delegate sees the original, unstripped text.
        assert_eq!(reply.message.unwrap().text(), "bot: hi");

        let reply = handler
            .call(ctx(json!({"type": "message", "text": "bothead: hi"})))
            .await;
        assert_eq!(reply, Reply::none());

        let reply = handler.call(ctx(json!({"type": "message", "text": "hi"}))).await;
        assert_eq!(reply, Reply::none());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_respond_tests_pattern_after_mention() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handler =
            PatternHandler::respond(Regex::new("^deploy$").unwrap(), counting(&counter));

        handler
            .call(ctx(json!({"type": "message", "text": "<@UBOT>: deploy"})))
            .await;
        handler
            .call(ctx(json!({"type": "message", "text": "bot deploy"})))
            .await;
        handler
            .call(ctx(json!({"type": "message", "text": "bot: please deploy"})))
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pattern_handler_is_introspectable() {
        let handler = PatternHandler::respond(Regex::new("ping").unwrap(), from_fn(|_| Reply::none()));
        assert!(handler.requires_mention());
        assert_eq!(handler.regex().as_str(), "ping");
    }

    #[tokio::test]
    async fn test_dispatcher_listen_registers_under_message() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new();
        dispatcher.listen("hello", counting(&counter)).unwrap();
        dispatcher.respond("hello", counting(&counter)).unwrap();

        assert_eq!(dispatcher.handler_count(MESSAGE), 2);

        let replies = dispatcher
            .dispatch(ctx(json!({"type": "message", "text": "bot: hello"})))
            .await;
        assert_eq!(replies.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        // Pattern handlers also see subtyped messages since they carry no
        // subtype constraint.
        dispatcher
            .dispatch(ctx(json!({"type": "message", "subtype": "me_message", "text": "hello"})))
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let mut dispatcher = Dispatcher::new();
        let result = dispatcher.listen("(unclosed", from_fn(|_| Reply::none()));
        assert!(result.is_err());
        assert_eq!(dispatcher.handler_count(MESSAGE), 0);
    }
}
