//! The context object handed to handlers.

use std::sync::Arc;

use crate::foundation::event::Event;
use crate::integration::session::Session;

/// Everything a handler sees while processing one event.
///
/// A single `BotContext` is shared (behind an `Arc`) by every handler of a
/// dispatch, so all of them observe the same immutable event.
///
/// ```rust,ignore
/// async fn greet(ctx: Arc<BotContext>) -> Reply {
///     let (Some(user), Some(channel)) = (ctx.event().user(), ctx.event().channel()) else {
///         return Reply::none();
///     };
///     Reply::send(ctx.session().mention(user, "hello!", channel))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BotContext {
    session: Arc<Session>,
    event: Event,
}

impl BotContext {
    /// Creates a new context for `event`.
    pub fn new(session: Arc<Session>, event: Event) -> Self {
        Self { session, event }
    }

    /// The event being dispatched.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The session of the bot that received the event.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}
