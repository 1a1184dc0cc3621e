//! Exam and question bank errors.

use thiserror::Error;

use super::question::Difficulty;

/// Errors raised by the question bank and exam generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    /// A question failed validation.
    #[error("Invalid question {field}: {message}")]
    InvalidQuestion {
        /// Offending field.
        field: &'static str,
        /// What is wrong.
        message: String,
    },

    /// Blueprint asks for no questions.
    #[error("Exam blueprint must request at least one question")]
    EmptyBlueprint,

    /// The bank does not hold enough matching questions.
    #[error("Not enough {difficulty} questions: requested {requested}, available {available}")]
    NotEnoughQuestions {
        /// Difficulty that ran short.
        difficulty: Difficulty,
        /// Requested count.
        requested: u32,
        /// Matching questions in the bank.
        available: u32,
    },
}

impl ExamError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidQuestion {
            field,
            message: message.into(),
        }
    }

    /// Returns an error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuestion { .. } => "INVALID_QUESTION",
            Self::EmptyBlueprint => "EMPTY_BLUEPRINT",
            Self::NotEnoughQuestions { .. } => "NOT_ENOUGH_QUESTIONS",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidQuestion { .. } | Self::EmptyBlueprint => 400,
            Self::NotEnoughQuestions { .. } => 422,
        }
    }
}
