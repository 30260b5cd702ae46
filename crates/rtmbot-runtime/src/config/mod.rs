//! Configuration module for the rtmbot runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the bot credentials, API endpoint and logging options.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, RtmConfig, SpanEventConfig,
};
pub use validation::validate_config;
