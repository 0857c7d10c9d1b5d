use derive_more::Display;
use serde::{Deserialize, Serialize};
use stowage_core::{
    config::ConfigError,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError, UpdateError},
};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match err.update_detail() {
            Some(UpdateError::CircularDependency { .. }) => {
                ErrorKind::Update(UpdateErrorKind::CircularDependency)
            }
            Some(UpdateError::SharedIdentityConflict { .. }) => {
                ErrorKind::Update(UpdateErrorKind::Conflict)
            }
            Some(UpdateError::TemporaryValue { .. }) => {
                ErrorKind::Update(UpdateErrorKind::TemporaryValue)
            }
            Some(UpdateError::InvalidEntityState { .. }) => {
                ErrorKind::Update(UpdateErrorKind::InvalidEntityState)
            }
            None => match (err.class, err.origin) {
                (ErrorClass::Configuration, _) => ErrorKind::Config,
                (ErrorClass::InvariantViolation | ErrorClass::NotFound, CoreErrorOrigin::Model) => {
                    ErrorKind::Model
                }
                _ => ErrorKind::Internal,
            },
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Update(UpdateErrorKind),

    /// The entity model was rejected or a lookup missed.
    Model,

    /// Configuration could not be read or failed validation.
    Config,

    /// The caller cannot remediate this.
    Internal,
}

///
/// UpdateErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum UpdateErrorKind {
    /// Writes depend on each other in a loop.
    CircularDependency,

    /// Entries merged onto one row disagree.
    Conflict,

    /// A placeholder value would have reached the store.
    TemporaryValue,

    /// An entry carries nothing to write.
    InvalidEntityState,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Model,
    Command,
    Graph,
    Batch,
    Config,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Model => Self::Model,
            CoreErrorOrigin::Command => Self::Command,
            CoreErrorOrigin::Graph => Self::Graph,
            CoreErrorOrigin::Batch => Self::Batch,
            CoreErrorOrigin::Config => Self::Config,
        }
    }
}
