//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound { path: PathBuf },

    /// The file extension has no enabled format feature.
    #[error("config file {path} has an unsupported format (enable toml-config or yaml-config)")]
    UnsupportedFormat { path: PathBuf },

    /// The merged sources do not fit the schema.
    #[error("cannot read configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A required value is empty or absent.
    #[error("`{field}` must be set")]
    MissingField { field: &'static str },

    /// A value is present but unusable.
    #[error("`{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Extract(Box::new(e))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
