use thiserror::Error;

use crate::services::ServiceError;

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("invalid input: {field} {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    #[error("validation failed at step {step}: {}", reasons.join("; "))]
    ValidationFailed {
        step: usize,
        reasons: Vec<String>,
    },

    #[error("{service} call failed: {source}")]
    ExternalCallFailed {
        service: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("wizard already submitted")]
    AlreadySubmitted,

    #[error("submit requires the final step: current {current}, last {last}")]
    NotAtFinalStep {
        current: usize,
        last: usize,
    },

    #[error("another operation is in flight")]
    Busy,

    #[error("wizard was disposed; result discarded")]
    Cancelled,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LendingError {
    pub(crate) fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        LendingError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn external(service: &'static str, source: ServiceError) -> Self {
        LendingError::ExternalCallFailed { service, source }
    }

    /// validation reasons, if this is a validation failure
    pub fn reasons(&self) -> &[String] {
        match self {
            LendingError::ValidationFailed { reasons, .. } => reasons,
            _ => &[],
        }
    }

    /// recoverable by the user correcting input or retrying the action
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            LendingError::Cancelled | LendingError::AlreadySubmitted | LendingError::InvalidConfiguration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LendingError>;
