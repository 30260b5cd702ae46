//! Event dispatcher.
//!
//! The [`Dispatcher`] keeps two registries:
//!
//! - `by_type`: event type → handlers
//! - `by_subtype`: event type → subtype → handlers
//!
//! Dispatching an event runs, in registration order, first every handler
//! registered for its `(type, subtype)` pair and then every handler
//! registered for its `type`. An event without a `type` reaches nobody.
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("message", log_everything);
//! dispatcher.register_with_subtype("message", "channel_join", greet);
//!
//! // {"type":"message","subtype":"channel_join"} runs greet, then log_everything
//! let replies = dispatcher.dispatch(ctx).await;
//! ```
//!
//! # Faulty handlers
//!
//! A handler that panics does not take the connection down. The panic is
//! caught, logged, and the handler contributes [`Reply::none`] to the
//! dispatch. The remaining handlers still run.

use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tower::Service;
use tracing::{Instrument, debug, debug_span, error, trace};

use crate::foundation::context::BotContext;
use crate::foundation::message::Reply;
use crate::framework::handler::{BoxFuture, BoxedHandler, Handler, into_handler};

/// Routes events to handlers by type and subtype.
#[derive(Default, Clone)]
pub struct Dispatcher {
    by_type: HashMap<String, Vec<BoxedHandler>>,
    by_subtype: HashMap<String, HashMap<String, Vec<BoxedHandler>>>,
}

impl Dispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every event of type `event_type`.
    ///
    /// Handlers are invoked in the order they were registered. Registering
    /// the same handler twice makes it run twice.
    pub fn register<H>(&mut self, event_type: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        self.register_boxed(event_type, into_handler(handler));
    }

    /// Registers an already erased handler for `event_type`.
    pub fn register_boxed(&mut self, event_type: impl Into<String>, handler: BoxedHandler) {
        self.by_type
            .entry(event_type.into())
            .or_default()
            .push(handler);
    }

    /// Registers `handler` for events of type `event_type` whose subtype is
    /// `subtype`.
    ///
    /// Events of that type without a subtype never reach it.
    pub fn register_with_subtype<H>(
        &mut self,
        event_type: impl Into<String>,
        subtype: impl Into<String>,
        handler: H,
    ) where
        H: Handler + 'static,
    {
        self.by_subtype
            .entry(event_type.into())
            .or_default()
            .entry(subtype.into())
            .or_default()
            .push(into_handler(handler));
    }

    /// Number of handlers registered for `event_type` without a subtype.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.by_type.get(event_type).map_or(0, Vec::len)
    }

    /// Number of handlers registered for `(event_type, subtype)`.
    pub fn subtype_handler_count(&self, event_type: &str, subtype: &str) -> usize {
        self.by_subtype
            .get(event_type)
            .and_then(|subtypes| subtypes.get(subtype))
            .map_or(0, Vec::len)
    }

    /// Returns the handlers an event would reach, in invocation order.
    fn route(&self, event_type: &str, subtype: Option<&str>) -> Vec<BoxedHandler> {
        let specific = subtype
            .and_then(|s| self.by_subtype.get(event_type)?.get(s))
            .into_iter()
            .flatten();
        let general = self.by_type.get(event_type).into_iter().flatten();
        specific.chain(general).cloned().collect()
    }

    /// Dispatches the event in `ctx` to every matching handler.
    ///
    /// Returns one [`Reply`] per invoked handler, in invocation order.
    pub async fn dispatch(&self, ctx: Arc<BotContext>) -> Vec<Reply> {
        let Some(event_type) = ctx.event().event_type() else {
            trace!("Event has no type, nothing to dispatch");
            return Vec::new();
        };
        let handlers = self.route(event_type, ctx.event().subtype());

        let span = debug_span!(
            "dispatch",
            event_type = %event_type,
            subtype = ctx.event().subtype().unwrap_or(""),
            handlers = handlers.len(),
        );

        async move {
            let mut replies = Vec::with_capacity(handlers.len());
            for (index, handler) in handlers.iter().enumerate() {
                trace!(handler_index = index, "Executing handler");
                replies.push(invoke(handler, Arc::clone(&ctx), index).await);
            }
            debug!(replies = replies.len(), "Dispatch finished");
            replies
        }
        .instrument(span)
        .await
    }
}

/// Runs one handler, turning a panic into an empty reply.
async fn invoke(handler: &BoxedHandler, ctx: Arc<BotContext>, index: usize) -> Reply {
    let future = match panic::catch_unwind(AssertUnwindSafe(|| handler.call(ctx))) {
        Ok(future) => future,
        Err(payload) => return handler_panicked(index, payload.as_ref()),
    };
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(reply) => reply,
        Err(payload) => handler_panicked(index, payload.as_ref()),
    }
}

fn handler_panicked(index: usize, payload: &(dyn Any + Send)) -> Reply {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    error!(handler_index = index, panic = %message, "Handler panicked, skipping it");
    Reply::none()
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("types", &self.by_type.len())
            .field("subtyped_types", &self.by_subtype.len())
            .finish()
    }
}

/// Tower Service implementation for Dispatcher.
///
/// Each `call` clones the registries (maps of `Arc` handlers, no handler is
/// copied) so the returned future is `'static`. The connection loop calls
/// [`Dispatcher::dispatch`] directly and never pays for this. Wrap the
/// dispatcher in middleware (timeouts, tracing layers, ...) only where that
/// clone per event is acceptable:
///
/// ```rust,ignore
/// let service = ServiceBuilder::new()
///     .layer(TimeoutLayer::new(Duration::from_secs(5)))
///     .service(dispatcher);
/// ```
impl Service<Arc<BotContext>> for Dispatcher {
    type Response = Vec<Reply>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<BotContext>) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.dispatch(ctx).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::event::Event;
    use crate::foundation::message::{OutgoingMessage, Status};
    use crate::framework::handler::from_fn;
    use crate::integration::{DisabledApiCaller, Identity, Session};
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt;

    fn ctx(value: serde_json::Value) -> Arc<BotContext> {
        let session = Arc::new(Session::new(
            Identity::new("bot", "UBOT"),
            Arc::new(DisabledApiCaller),
        ));
        Arc::new(BotContext::new(session, Event::try_from(value).unwrap()))
    }

    /// Handler that records `tag` into a shared log and replies with it.
    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> impl Handler + 'static {
        let log = Arc::clone(log);
        from_fn(move |_| {
            log.lock().unwrap().push(tag);
            Reply::send(OutgoingMessage::new(tag, "C1"))
        })
    }

    fn texts(replies: &[Reply]) -> Vec<&str> {
        replies
            .iter()
            .filter_map(|r| r.message.as_ref().map(OutgoingMessage::text))
            .collect()
    }

    #[tokio::test]
    async fn test_event_without_type_reaches_nobody() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("message", recording(&log, "general"));
        dispatcher.register_with_subtype("message", "bot_message", recording(&log, "specific"));

        let replies = dispatcher
            .dispatch(ctx(json!({"subtype": "bot_message", "text": "hi"})))
            .await;

        assert!(replies.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subtype_handlers_run_before_type_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("message", recording(&log, "t1"));
        dispatcher.register_with_subtype("message", "changed", recording(&log, "s1"));
        dispatcher.register("message", recording(&log, "t2"));
        dispatcher.register_with_subtype("message", "changed", recording(&log, "s2"));
        dispatcher.register_with_subtype("message", "deleted", recording(&log, "other"));

        let replies = dispatcher
            .dispatch(ctx(json!({"type": "message", "subtype": "changed"})))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["s1", "s2", "t1", "t2"]);
        assert_eq!(texts(&replies), vec!["s1", "s2", "t1", "t2"]);
    }

    #[tokio::test]
    async fn test_event_without_subtype_skips_subtype_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register_with_subtype("message", "changed", recording(&log, "specific"));
        dispatcher.register("message", recording(&log, "general"));

        dispatcher.dispatch(ctx(json!({"type": "message"}))).await;

        assert_eq!(*log.lock().unwrap(), vec!["general"]);
    }

    #[tokio::test]
    async fn test_unknown_subtype_still_runs_type_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("message", recording(&log, "general"));

        let replies = dispatcher
            .dispatch(ctx(json!({"type": "message", "subtype": "nobody_listens"})))
            .await;

        assert_eq!(replies.len(), 1);
    }

    #[tokio::test]
    async fn test_registration_count_grows() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let event = json!({"type": "hello"});

        assert_eq!(dispatcher.dispatch(ctx(event.clone())).await.len(), 0);
        dispatcher.register("hello", recording(&log, "a"));
        assert_eq!(dispatcher.dispatch(ctx(event.clone())).await.len(), 1);
        dispatcher.register("hello", recording(&log, "b"));
        assert_eq!(dispatcher.dispatch(ctx(event)).await.len(), 2);

        assert_eq!(dispatcher.handler_count("hello"), 2);
        assert_eq!(*log.lock().unwrap(), vec!["a", "a", "b"]);
    }

    #[tokio::test]
    async fn test_same_handler_registered_twice_runs_twice() {
        let calls = Arc::new(Mutex::new(0));
        let handler: BoxedHandler = {
            let calls = Arc::clone(&calls);
            into_handler(from_fn(move |_| {
                *calls.lock().unwrap() += 1;
                Reply::none()
            }))
        };
        let mut dispatcher = Dispatcher::new();
        dispatcher.register_boxed("hello", Arc::clone(&handler));
        dispatcher.register_boxed("hello", handler);

        dispatcher.dispatch(ctx(json!({"type": "hello"}))).await;
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    async fn exploding(_ctx: Arc<BotContext>) -> Reply {
        panic!("handler bug")
    }

    #[tokio::test]
    async fn test_panicking_handler_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("message", recording(&log, "before"));
        dispatcher.register("message", exploding);
        dispatcher.register("message", from_fn(|_| panic!("sync handler bug")));
        dispatcher.register("message", recording(&log, "after"));

        let replies = dispatcher.dispatch(ctx(json!({"type": "message"}))).await;

        assert_eq!(replies.len(), 4);
        assert_eq!(replies[1], Reply::none());
        assert_eq!(replies[2], Reply::none());
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[tokio::test]
    async fn test_async_closure_handler() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("goodbye", |ctx: Arc<BotContext>| async move {
            assert_eq!(ctx.event().event_type(), Some("goodbye"));
            Reply::shutdown_now()
        });

        let replies = dispatcher.dispatch(ctx(json!({"type": "goodbye"}))).await;
        assert_eq!(replies[0].status, Status::ShutdownNow);
    }

    #[tokio::test]
    async fn test_dispatcher_as_service() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("hello", recording(&log, "svc"));

        let replies = dispatcher
            .oneshot(ctx(json!({"type": "hello"})))
            .await
            .unwrap();

        assert_eq!(texts(&replies), vec!["svc"]);
    }
}
