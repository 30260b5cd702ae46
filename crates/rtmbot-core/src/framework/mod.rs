//! Framework layer - Event processing and routing.
//!
//! This module contains the per-event pipeline:
//! - Handler trait and implementations
//! - Type/subtype dispatcher with panic isolation
//! - Pattern registry for chat messages (listen and respond)
//! - Response coordinator turning replies into writes and a loop verdict

pub mod coordinator;
pub mod dispatcher;
pub mod handler;
pub mod matcher;

pub use coordinator::{Verdict, apply};
pub use dispatcher::Dispatcher;
pub use handler::{BoxFuture, BoxedHandler, FnHandler, Handler, from_fn, into_handler};
pub use matcher::PatternHandler;
