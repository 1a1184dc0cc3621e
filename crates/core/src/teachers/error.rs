//! Teacher profile errors.

use thiserror::Error;

use super::types::WizardStep;

/// Errors raised by the teacher profile wizard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// A field failed validation.
    #[error("{field}: {message}")]
    Invalid {
        /// Field name as sent by the client.
        field: &'static str,
        /// What is wrong.
        message: String,
    },

    /// A step was submitted before an earlier one.
    #[error("Complete the {expected} step before the {got} step")]
    StepOutOfOrder {
        /// First unfinished step.
        expected: WizardStep,
        /// Submitted step.
        got: WizardStep,
    },

    /// Finish was requested with a step still missing.
    #[error("The {0} step has not been completed")]
    IncompleteStep(WizardStep),

    /// Unknown step name in a request path.
    #[error("Unknown profile step '{0}'")]
    UnknownStep(String),

    /// Status change not allowed.
    #[error("Cannot change teacher status from {from} to {to}")]
    InvalidStatusChange {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },
}

impl ProfileError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    /// Returns an error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "INVALID_PROFILE_FIELD",
            Self::StepOutOfOrder { .. } => "STEP_OUT_OF_ORDER",
            Self::IncompleteStep(_) => "INCOMPLETE_PROFILE",
            Self::UnknownStep(_) => "UNKNOWN_STEP",
            Self::InvalidStatusChange { .. } => "INVALID_STATUS_CHANGE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Invalid { .. } | Self::UnknownStep(_) => 400,
            Self::StepOutOfOrder { .. } | Self::IncompleteStep(_) | Self::InvalidStatusChange { .. } => {
                422
            }
        }
    }
}
