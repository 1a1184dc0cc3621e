//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every method takes the school it acts for and filters on it.

pub mod account;
pub mod class;
pub mod dashboard;
pub mod exam;
pub mod fiscal;
pub mod journal;
pub mod posting;
pub mod question;
pub mod result;
pub mod school;
pub mod student;
pub mod teacher;

pub use account::{
    AccountBalanceAsOf, AccountError, AccountFilter, AccountRepository, AccountWithBalance,
    CreateAccountInput, TrialBalance, TrialBalanceRow, UpdateAccountInput,
};
pub use class::{ClassError, ClassRepository, CreateClassInput, UpdateClassInput};
pub use dashboard::{DashboardError, DashboardRepository};
pub use exam::{ExamError, ExamQuestionDetail, ExamRepository, ExamWithQuestions, GenerateExamInput};
pub use fiscal::{CreateFiscalYearInput, FiscalError, FiscalRepository};
pub use journal::{
    JournalEntryWithLines, JournalError, JournalFilter, JournalRepository, LedgerSettings,
    UpdateDraftInput,
};
pub use posting::{PostingError, PostingRepository};
pub use question::{QuestionError, QuestionFilter, QuestionInput, QuestionRepository};
pub use result::{ClassTermReport, ResultError, ResultFilter, ResultRepository, UpsertResultInput};
pub use school::{CreateSchoolInput, SchoolError, SchoolRepository};
pub use student::{CreateStudentInput, StudentError, StudentRepository};
pub use teacher::{TeacherError, TeacherFilter, TeacherRepository, UpdateTeacherInput, WizardProgress};

use scholaris_shared::AppError;
use sea_orm::{DbErr, SqlErr};

/// Maps a domain rule failure onto the API taxonomy by its HTTP status.
pub(crate) fn domain_error(status: u16, message: String) -> AppError {
    match status {
        400 => AppError::Validation(message),
        403 => AppError::Forbidden(message),
        404 => AppError::NotFound(message),
        409 => AppError::Conflict(message),
        500.. => AppError::Internal(message),
        _ => AppError::BusinessRule(message),
    }
}

/// Maps a database failure, turning constraint violations into conflicts.
pub(crate) fn database_error(err: &DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            AppError::Conflict(format!("Record already exists: {detail}"))
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            AppError::Conflict(format!("Record is still referenced: {detail}"))
        }
        _ => {
            tracing::error!(error = %err, "Database operation failed");
            AppError::Database(err.to_string())
        }
    }
}

/// Takes the statement log of a mock connection once every repository
/// holding it has been dropped.
#[cfg(test)]
pub(crate) fn transaction_log(
    db: std::sync::Arc<sea_orm::DatabaseConnection>,
) -> Vec<sea_orm::Transaction> {
    std::sync::Arc::try_unwrap(db)
        .map(sea_orm::DatabaseConnection::into_transaction_log)
        .unwrap_or_else(|_| panic!("mock connection is still shared"))
}
