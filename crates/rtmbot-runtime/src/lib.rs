//! rtmbot Runtime - Connection management for the rtmbot framework.
//!
//! This crate provides:
//! - The connection manager ([`Bot`]): handshake, event loop, migration
//! - Connection state tracking ([`ConnectionState`])
//! - Configuration loading ([`config`])
//! - Logging configuration ([`logging`])
//! - Plugins ([`Plugin`])
//!
//! ```ignore
//! use rtmbot_runtime::{Bot, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let mut bot = Bot::from_config(&config.bot)?;
//!     bot.respond("^ping$", ping)?;
//!
//!     // Run until a handler shuts the bot down or Ctrl+C
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod state;

// Re-exports
pub use bot::Bot;
pub use config::{BotConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, RtmConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use plugin::Plugin;
pub use state::{ConnectionState, Phase};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
