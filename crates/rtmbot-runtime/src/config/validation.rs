//! Checks that run after extraction, before a config is handed out.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, RtmConfig};

/// Rejects configurations the bot cannot start with.
pub fn validate_config(config: &RtmConfig) -> ConfigResult<()> {
    let bot = &config.bot;
    if bot.token.trim().is_empty() {
        return Err(ConfigError::MissingField { field: "bot.token" });
    }

    let url = bot.api_base_url.trim();
    if url.is_empty() {
        return Err(ConfigError::MissingField {
            field: "bot.api_base_url",
        });
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ConfigError::invalid(
            "bot.api_base_url",
            format!("{url:?} is not an http(s) URL"),
        ));
    }

    if bot.api_timeout_secs == 0 {
        return Err(ConfigError::invalid("bot.api_timeout_secs", "must be positive"));
    }

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::MissingField {
            field: "logging.file_path",
        });
    }

    Ok(())
}
