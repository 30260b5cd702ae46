//! Handler trait and implementations.
//!
//! A handler receives the shared [`BotContext`] and produces a [`Reply`]. It
//! never touches the connection: whatever it wants to say goes into the reply
//! and is written later by the response coordinator.
//!
//! Any async closure taking `Arc<BotContext>` is a handler:
//!
//! ```rust,ignore
//! dispatcher.register("hello", |_ctx: Arc<BotContext>| async { Reply::none() });
//! ```
//!
//! Synchronous logic can be wrapped with [`from_fn`]:
//!
//! ```rust,ignore
//! dispatcher.register("message", from_fn(|ctx| match ctx.event().text() {
//!     Some("quit") => Reply::shutdown(),
//!     _ => Reply::none(),
//! }));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future;

use crate::foundation::context::BotContext;
use crate::foundation::message::Reply;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A callback invoked for events matching its registration.
pub trait Handler: Send + Sync {
    /// Runs the handler for one event.
    fn call(&self, ctx: Arc<BotContext>) -> BoxFuture<'static, Reply>;
}

/// Shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

impl<F, Fut> Handler for F
where
    F: Fn(Arc<BotContext>) -> Fut + Send + Sync,
    Fut: Future<Output = Reply> + Send + 'static,
{
    fn call(&self, ctx: Arc<BotContext>) -> BoxFuture<'static, Reply> {
        Box::pin(self(ctx))
    }
}

/// Erases a handler.
pub fn into_handler<H>(handler: H) -> BoxedHandler
where
    H: Handler + 'static,
{
    Arc::new(handler)
}

/// Handler built from a synchronous function.
#[derive(Clone)]
pub struct FnHandler<F> {
    f: F,
}

/// Wraps a synchronous function as a [`Handler`].
pub fn from_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&BotContext) -> Reply + Send + Sync,
{
    FnHandler { f }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&BotContext) -> Reply + Send + Sync,
{
    fn call(&self, ctx: Arc<BotContext>) -> BoxFuture<'static, Reply> {
        Box::pin(future::ready((self.f)(&ctx)))
    }
}
