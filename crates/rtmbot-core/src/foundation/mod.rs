//! Foundation layer - Core abstractions and type system.
//!
//! This module contains the fundamental building blocks of rtmbot:
//! - The event envelope decoded from inbound frames
//! - Outgoing messages, statuses and handler replies
//! - The handler context
//! - Error types shared by every layer

pub mod context;
pub mod error;
pub mod event;
pub mod message;

pub use context::BotContext;
pub use error::{
    ApiError, ApiResult, DecodeError, PatternError, TransportError, TransportResult,
};
pub use event::Event;
pub use message::{OutgoingMessage, Reply, Status};
