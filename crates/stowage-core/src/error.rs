use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without a structured detail payload.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct an InternalError carrying update-pipeline detail.
    ///
    /// The message is rendered from the detail so both always agree.
    pub(crate) fn update(class: ErrorClass, origin: ErrorOrigin, detail: UpdateError) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail: Some(ErrorDetail::Update(detail)),
        }
    }

    /// Construct a model-origin invariant violation.
    pub(crate) fn model_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Model,
            message.into(),
        )
    }

    /// Construct a model-origin not-found error.
    pub(crate) fn model_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, ErrorOrigin::Model, message.into())
    }

    /// Construct a graph-origin invariant violation.
    pub(crate) fn graph_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Graph,
            message.into(),
        )
    }

    /// Construct a batch-origin internal error.
    pub(crate) fn batch_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Batch, message.into())
    }

    /// Construct a config-origin configuration error.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Config, message.into())
    }

    /// Construct the unbreakable-cycle error raised by topological sorts.
    pub(crate) fn circular_dependency(cycle: impl Into<String>) -> Self {
        Self::update(
            ErrorClass::Conflict,
            ErrorOrigin::Graph,
            UpdateError::CircularDependency {
                cycle: cycle.into(),
            },
        )
    }

    /// Construct a row conflict between entries merged onto one command.
    pub(crate) fn shared_identity_conflict(
        table: impl Into<String>,
        entity_types: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::update(
            ErrorClass::Conflict,
            ErrorOrigin::Command,
            UpdateError::SharedIdentityConflict {
                table: table.into(),
                entity_types,
                reason: reason.into(),
            },
        )
    }

    /// Construct the stale-temporary-value configuration error.
    pub(crate) fn temporary_value(
        entity_type: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self::update(
            ErrorClass::Configuration,
            ErrorOrigin::Batch,
            UpdateError::TemporaryValue {
                entity_type: entity_type.into(),
                property: property.into(),
            },
        )
    }

    /// Construct the error raised for entries that carry nothing to write.
    pub(crate) fn invalid_entity_state(
        entity_type: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self::update(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Command,
            UpdateError::InvalidEntityState {
                entity_type: entity_type.into(),
                state: state.into(),
            },
        )
    }

    /// Borrow the update-pipeline detail, if any.
    #[must_use]
    pub const fn update_detail(&self) -> Option<&UpdateError> {
        match &self.detail {
            Some(ErrorDetail::Update(detail)) => Some(detail),
            None => None,
        }
    }

    #[must_use]
    pub const fn is_circular_dependency(&self) -> bool {
        matches!(
            self.detail,
            Some(ErrorDetail::Update(UpdateError::CircularDependency { .. }))
        )
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Update(UpdateError),
}

///
/// UpdateError
///
/// Update-pipeline structured error detail.
/// Never returned directly; always wrapped in [`ErrorDetail::Update`].
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum UpdateError {
    #[error(
        "unable to save changes because a circular dependency was detected in the data to save: '{cycle}'"
    )]
    CircularDependency { cycle: String },

    #[error(
        "conflicting row changes for table '{table}' ({}): {reason}",
        .entity_types.join(", ")
    )]
    SharedIdentityConflict {
        table: String,
        entity_types: Vec<String>,
        reason: String,
    },

    #[error(
        "the value for '{entity_type}.{property}' is a temporary value; a value generator must produce a real value before the row is written"
    )]
    TemporaryValue {
        entity_type: String,
        property: String,
    },

    #[error("entry for '{entity_type}' has state {state} and cannot be written")]
    InvalidEntityState { entity_type: String, state: String },
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    Configuration,
    Internal,
    InvariantViolation,
    NotFound,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Model,
    Command,
    Graph,
    Batch,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Model => "model",
            Self::Command => "command",
            Self::Graph => "graph",
            Self::Batch => "batch",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
