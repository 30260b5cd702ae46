//! Layered configuration loading on top of figment.
//!
//! Sources, later ones winning:
//!
//! 1. [`RtmConfig::default`]
//! 2. `rtmbot.<ext>` from the first search directory that has one
//! 3. `rtmbot.<profile>.<ext>` next to it
//! 4. `RTMBOT_*` environment variables, `__` separating sections
//!    (`RTMBOT_BOT__TOKEN`, `RTMBOT_LOGGING__LEVEL`)
//! 5. values set on the [`ConfigLoader`] itself
//!
//! `<ext>` is `toml` with the default `toml-config` feature, and `yaml` /
//! `yml` with `yaml-config`.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new().profile("production").load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::RtmConfig;
use super::validation::validate_config;

const FILE_STEM: &str = "rtmbot";
const ENV_PREFIX: &str = "RTMBOT_";
const PROFILE_VAR: &str = "RTMBOT_PROFILE";

/// Selects the `rtmbot.<profile>.<ext>` overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Case-insensitive; `dev` and `prod` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "dev" | "development" => Self::Development,
            "prod" | "production" => Self::Production,
            _ => Self::Custom(name),
        }
    }

    /// Profile named by `RTMBOT_PROFILE`, or [`Profile::Development`].
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder collecting the sources of an [`RtmConfig`].
#[derive(Debug)]
pub struct ConfigLoader {
    profile: Profile,
    file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader with the profile from `RTMBOT_PROFILE`, the default search
    /// directories and environment variables enabled.
    pub fn new() -> Self {
        Self {
            profile: Profile::from_env(),
            file: None,
            search_paths: Vec::new(),
            env: true,
            overrides: Figment::new(),
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Searches `dir` instead of the current and user config directories.
    ///
    /// Can be called repeatedly; directories are tried in order.
    pub fn search_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.search_paths.push(dir.as_ref().to_path_buf());
        self
    }

    /// Loads exactly `path`, skipping the directory search and profile overlay.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Sets `bot.token`, overriding every other source.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.overrides = self
            .overrides
            .merge(Serialized::default("bot.token", token.into()));
        self
    }

    /// Layers a whole config over every other source.
    pub fn merge(mut self, config: RtmConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Merges all sources, then extracts and validates the result.
    pub fn load(self) -> ConfigResult<RtmConfig> {
        let profile = self.profile.clone();
        let config: RtmConfig = self.figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            %profile,
            api_base_url = %config.bot.api_base_url,
            level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(RtmConfig::default()));

        figment = match &self.file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound { path: path.clone() });
                }
                info!(path = %path.display(), "Loading configuration file");
                merge_file(figment, path)
                    .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.clone() })?
            }
            None => self.merge_found_files(figment),
        };

        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        Ok(figment.merge(self.overrides))
    }

    fn directories(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join(FILE_STEM)))
            .collect()
    }

    /// Merges the first `rtmbot.<ext>` found and its profile overlay.
    fn merge_found_files(&self, figment: Figment) -> Figment {
        for dir in self.directories() {
            for ext in extensions() {
                let base = dir.join(format!("{FILE_STEM}.{ext}"));
                if !base.is_file() {
                    continue;
                }
                info!(path = %base.display(), "Loading configuration file");
                let Some(mut figment) = merge_file(figment.clone(), &base) else {
                    continue;
                };

                let overlay = dir.join(format!("{FILE_STEM}.{}.{ext}", self.profile));
                if overlay.is_file() {
                    debug!(path = %overlay.display(), "Loading profile overlay");
                    figment = merge_file(figment.clone(), &overlay).unwrap_or(figment);
                }
                return figment;
            }
        }
        warn!("No configuration file found, using defaults");
        figment
    }
}

/// File extensions with an enabled format.
fn extensions() -> Vec<&'static str> {
    let mut extensions = Vec::new();
    #[cfg(feature = "toml-config")]
    extensions.push("toml");
    #[cfg(feature = "yaml-config")]
    extensions.extend(["yaml", "yml"]);
    extensions
}

/// Merges `path` with the provider matching its extension.
///
/// `None` if the extension is unknown or its feature is disabled.
fn merge_file(figment: Figment, path: &Path) -> Option<Figment> {
    match path.extension()?.to_str()? {
        #[cfg(feature = "toml-config")]
        "toml" => Some(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Some(figment.merge(Yaml::file(path))),
        _ => None,
    }
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<RtmConfig> {
    ConfigLoader::new().load()
}

/// Loads `path` plus environment overrides.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<RtmConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use figment::Jail;

    #[test]
    fn test_missing_token_is_rejected() {
        Jail::expect_with(|jail| {
            let result = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load();
            assert!(matches!(
                result,
                Err(ConfigError::MissingField { field: "bot.token" })
            ));
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_then_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "rtmbot.toml",
                r#"
                [bot]
                token = "xoxb-file"
                api_timeout_secs = 5

                [logging]
                level = "warn"
                "#,
            )?;
            jail.set_env("RTMBOT_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.bot.token, "xoxb-file");
            assert_eq!(config.bot.api_timeout_secs, 5);
            assert_eq!(config.logging.level, LogLevel::Debug);

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .token("xoxb-override")
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.bot.token, "xoxb-override");
            Ok(())
        });
    }

    #[test]
    fn test_profile_overlay_wins_over_base() {
        Jail::expect_with(|jail| {
            jail.create_file("rtmbot.toml", "[bot]\ntoken = \"xoxb-dev\"\n")?;
            jail.create_file("rtmbot.production.toml", "[bot]\ntoken = \"xoxb-prod\"\n")?;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .profile("prod")
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.bot.token, "xoxb-prod");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let result = ConfigLoader::new().file("/nonexistent/rtmbot.toml").load();
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_explicit_file_with_unknown_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("rtmbot.ini", "token = x")?;
            let result = ConfigLoader::new()
                .file(jail.directory().join("rtmbot.ini"))
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_value_is_an_extract_error() {
        Jail::expect_with(|jail| {
            jail.create_file("rtmbot.toml", "[bot]\napi_timeout_secs = \"soon\"\n")?;
            let result = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::Extract(_))));
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("Staging").as_str(), "staging");
    }
}
