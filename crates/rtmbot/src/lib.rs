//! # rtmbot
//!
//! An event-driven bot framework for real-time messaging APIs.
//!
//! ## Overview
//!
//! rtmbot keeps one persistent connection to the chat service, decodes every
//! inbound frame into an [`Event`](rtmbot_core::Event), routes it to the
//! handlers registered for its type, subtype or text, and writes back whatever
//! the handlers reply.
//!
//! ```text
//! ┌────────────┐     ┌────────────┐     ┌───────────┐     ┌─────────────┐
//! │ Connection │────▶│ Dispatcher │────▶│  Handler  │────▶│ Coordinator │──▶ Connection
//! │ (Bot)      │     │            │────▶│  Handler  │────▶│             │
//! └────────────┘     └────────────┘     └───────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rtmbot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let mut bot = Bot::from_config(&config.bot)?;
//!     bot.respond("^ping$", respond_with("pong"))?
//!         .listen("(?i)ship it", react_with("rocket"))?;
//!
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub mod actions;

pub use rtmbot_core as core;
pub use rtmbot_runtime as runtime;
pub use rtmbot_transport as transport;

pub use actions::{ReactWith, RespondWith, react_with, respond_with};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use rtmbot::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use rtmbot_runtime::config::{ConfigLoader, RtmConfig, load_config};
    pub use rtmbot_runtime::{Bot, Plugin, RuntimeError, logging};

    // Handlers and replies
    pub use rtmbot_core::{
        BotContext, Event, Handler, OutgoingMessage, Reply, Session, Status, from_fn,
    };

    // Built-in actions
    pub use crate::actions::{react_with, respond_with};
}
