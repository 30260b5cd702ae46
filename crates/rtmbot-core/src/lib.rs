//! # rtmbot Core
//!
//! The event engine of the rtmbot framework.
//!
//! This crate provides everything between a decoded inbound event and the
//! messages written back to the connection: the handler trait, the
//! type/subtype dispatcher, the pattern registry and the response coordinator.
//! It knows nothing about sockets or HTTP; those live behind the
//! [`Connector`] and [`ApiCaller`] traits and are implemented in
//! `rtmbot-transport`.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Events**: JSON object envelopes ([`Event`])
//! - **Replies**: what a handler returns ([`Reply`], [`Status`], [`OutgoingMessage`])
//! - **Context**: the per-event handler argument ([`BotContext`])
//!
//! ### Framework Layer
//!
//! - **Handlers**: [`Handler`], [`from_fn`]
//! - **Dispatcher**: routing by `type` and `subtype` ([`Dispatcher`])
//! - **Patterns**: listen/respond guards ([`PatternHandler`])
//! - **Coordinator**: applying replies ([`apply`], [`Verdict`])
//!
//! ### Integration Layer
//!
//! - **API calls**: [`ApiCaller`]
//! - **Connection**: [`Connector`], [`Connection`], [`Frame`]
//! - **Session**: bot identity and helpers ([`Session`], [`Identity`])
//!
//! ## Event Flow
//!
//! ```text
//! ┌────────────┐  Event  ┌────────────┐ Vec<Reply> ┌─────────────┐
//! │ Connection │────────▶│ Dispatcher │───────────▶│ Coordinator │──▶ writes
//! └────────────┘         └────────────┘            └─────────────┘──▶ Verdict
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use rtmbot_core::prelude::*;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.respond("^ping$", from_fn(|ctx| {
//!     let channel = ctx.event().channel().unwrap_or_default();
//!     Reply::send(OutgoingMessage::new("pong", channel))
//! }))?;
//!
//! let replies = dispatcher.dispatch(ctx).await;
//! let verdict = apply(replies, &mut connection).await;
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod integration;

// Re-export foundation types
pub use foundation::{
    ApiError, ApiResult, BotContext, DecodeError, Event, OutgoingMessage, PatternError, Reply,
    Status, TransportError, TransportResult,
};

// Re-export framework types
pub use framework::{
    BoxFuture, BoxedHandler, Dispatcher, FnHandler, Handler, PatternHandler, Verdict, apply,
    from_fn, into_handler,
};

// Re-export integration types
pub use integration::{
    ApiCaller, BoxedApiCaller, BoxedConnection, BoxedConnector, Connection, Connector,
    DisabledApiCaller, Frame, Identity, MessageSink, Params, Session, ensure_ok, params,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{
        BoxFuture, BoxedHandler, Dispatcher, Handler, Verdict, apply, from_fn, into_handler,
    };
    pub use super::integration::{Identity, MessageSink, Session, params};
}
