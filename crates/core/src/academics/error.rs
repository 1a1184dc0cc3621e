//! Grading error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while recording or grading results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    /// A score is negative or above its maximum.
    #[error("{field} score {value} must be between 0 and {max}")]
    ScoreOutOfRange {
        /// `ca` or `exam`.
        field: &'static str,
        /// Submitted score.
        value: Decimal,
        /// Allowed maximum.
        max: Decimal,
    },

    /// Session string is not `YYYY/YYYY` with consecutive years.
    #[error("Invalid academic session '{0}', expected e.g. 2024/2025")]
    InvalidSession(String),

    /// Unknown term name.
    #[error("Invalid term '{0}', expected first, second or third")]
    InvalidTerm(String),

    /// Grading scale is malformed.
    #[error("Invalid grading scale: {0}")]
    InvalidScale(String),

    /// Subject name is blank.
    #[error("Subject is required")]
    EmptySubject,
}

impl GradingError {
    /// Returns an error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ScoreOutOfRange { .. } => "SCORE_OUT_OF_RANGE",
            Self::InvalidSession(_) => "INVALID_SESSION",
            Self::InvalidTerm(_) => "INVALID_TERM",
            Self::InvalidScale(_) => "INVALID_GRADING_SCALE",
            Self::EmptySubject => "EMPTY_SUBJECT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        400
    }
}
