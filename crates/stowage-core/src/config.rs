//! Module: config
//! Responsibility: tunables for one `CommandBatchPreparer`.
//! Does not own: table annotations or batch accumulators themselves.
//! Boundary: loaded from TOML, validated once, then copied into the preparer.

use crate::{DEFAULT_MAX_BATCH_SIZE, error::InternalError};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// UpdateConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateConfig {
    /// Packed execution batches with fewer commands than this are split
    /// into single-command batches.
    pub min_batch_size: usize,

    /// Capacity of the bundled `BoundedBatchFactory`.
    pub max_batch_size: usize,

    /// Include key values in errors and log events.
    pub sensitive_data_logging: bool,

    pub parameter_prefix: String,

    /// Schema applied to mapped tables that declare none.
    pub default_schema: Option<String>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 1,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            sensitive_data_logging: false,
            parameter_prefix: "p".to_string(),
            default_schema: None,
        }
    }
}

impl UpdateConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            origin: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_batch_size == 0 {
            return Err(ConfigError::invalid("min_batch_size", "must be at least 1"));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::invalid("max_batch_size", "must be at least 1"));
        }
        if self.min_batch_size > self.max_batch_size {
            return Err(ConfigError::invalid(
                "min_batch_size",
                format!("must not exceed max_batch_size ({})", self.max_batch_size),
            ));
        }

        let mut chars = self.parameter_prefix.chars();
        let leading_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !leading_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::invalid(
                "parameter_prefix",
                format!("'{}' is not an identifier", self.parameter_prefix),
            ));
        }

        Ok(())
    }
}

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read update config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse update config {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("invalid update config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config(err.to_string())
    }
}
