//! Error responses.
//!
//! Every failure leaves the API as
//! `{"success": false, "error": "<message>", "code": "<CODE>"}` with the
//! status of the underlying [`AppError`].

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use validator::ValidationErrors;

use scholaris_db::repositories::{
    AccountError, ClassError, DashboardError, ExamError, FiscalError, JournalError, PostingError,
    QuestionError, ResultError, SchoolError, StudentError, TeacherError,
};
use scholaris_shared::AppError;

/// Error type returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human readable message.
    pub error: String,
    /// Stable machine readable code.
    pub code: &'static str,
}

impl ApiError {
    /// A 400 with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// A 404 with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.is_internal() {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            error: self.0.public_message(),
            code: self.0.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

macro_rules! from_repository_errors {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for ApiError {
                fn from(err: $err) -> Self {
                    Self(AppError::from(err))
                }
            }
        )*
    };
}

from_repository_errors!(
    AccountError,
    ClassError,
    DashboardError,
    ExamError,
    FiscalError,
    JournalError,
    PostingError,
    QuestionError,
    ResultError,
    SchoolError,
    StudentError,
    TeacherError,
);

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        let mut fields: Vec<String> = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let reason = errors
                    .iter()
                    .find_map(|e| e.message.as_ref().map(ToString::to_string))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field} {reason}")
            })
            .collect();
        fields.sort();
        Self::validation(fields.join("; "))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}
