//! Posting repository: business events to posted journal entries.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::posting::{PostingError as RuleError, PostingEvent, PostingRules, SystemAccount};
use scholaris_shared::AppError;
use scholaris_shared::types::{AccountId, SchoolId, StudentId};

use super::journal::{JournalEntryWithLines, JournalError, JournalRepository, LedgerSettings};
use super::{database_error, domain_error};
use crate::entities::{chart_of_accounts, students};

/// Error types for posting operations.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// The event could not be turned into lines.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// The event names a student of another school or no student at all.
    #[error("Student not found: {0}")]
    StudentNotFound(Uuid),

    /// Writing the entry failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::Rule(e) => domain_error(e.http_status_code(), e.to_string()),
            PostingError::StudentNotFound(_) => Self::NotFound(err.to_string()),
            PostingError::Journal(e) => e.into(),
            PostingError::Database(e) => database_error(&e),
        }
    }
}

/// Posting repository.
#[derive(Debug, Clone)]
pub struct PostingRepository {
    db: Arc<DatabaseConnection>,
    journal: JournalRepository,
}

impl PostingRepository {
    /// Creates a posting repository writing through a journal repository
    /// with the given settings.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, settings: LedgerSettings) -> Self {
        let journal = JournalRepository::with_settings(Arc::clone(&db), settings);
        Self { db, journal }
    }

    /// Turns `event` into a balanced entry against the school's system
    /// accounts and writes it posted.
    ///
    /// # Errors
    ///
    /// Returns `MissingAccount` when the chart lacks a role the event needs,
    /// `StudentNotFound` for a student outside the school, or any journal
    /// error raised while writing.
    pub async fn post_event(
        &self,
        school_id: Uuid,
        event: PostingEvent,
    ) -> Result<JournalEntryWithLines, PostingError> {
        if let Some(student_id) = event_student(&event) {
            self.ensure_student(school_id, student_id.into_inner()).await?;
        }

        let resolver = self.system_accounts(school_id).await?;
        let prepared = PostingRules::prepare(&event, &resolver).inspect_err(|e| {
            warn!(%school_id, event = event.kind(), error = %e, "Posting rejected");
        })?;

        let entry = self
            .journal
            .create_entry(prepared.into_new_entry(SchoolId::from_uuid(school_id)))
            .await?;

        info!(
            %school_id,
            event = event.kind(),
            entry_id = %entry.entry.id,
            entry_number = %entry.entry.entry_number,
            "Business event posted"
        );
        Ok(entry)
    }

    /// Maps each system role to the school's account with the standard code.
    async fn system_accounts(
        &self,
        school_id: Uuid,
    ) -> Result<HashMap<SystemAccount, AccountId>, DbErr> {
        let codes: Vec<&str> = SystemAccount::ALL.iter().map(|role| role.code()).collect();
        let accounts = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .filter(chart_of_accounts::Column::Code.is_in(codes))
            .all(self.db.as_ref())
            .await?;

        Ok(accounts
            .into_iter()
            .filter_map(|account| {
                SystemAccount::from_code(&account.code)
                    .map(|role| (role, AccountId::from_uuid(account.id)))
            })
            .collect())
    }

    async fn ensure_student(&self, school_id: Uuid, student_id: Uuid) -> Result<(), PostingError> {
        let count = students::Entity::find()
            .filter(students::Column::SchoolId.eq(school_id))
            .filter(students::Column::Id.eq(student_id))
            .count(self.db.as_ref())
            .await?;
        if count == 0 {
            return Err(PostingError::StudentNotFound(student_id));
        }
        Ok(())
    }
}

const fn event_student(event: &PostingEvent) -> Option<StudentId> {
    match event {
        PostingEvent::FeeInvoiced { student_id, .. }
        | PostingEvent::FeePaymentReceived { student_id, .. }
        | PostingEvent::WalletTopUp { student_id, .. }
        | PostingEvent::WalletSpend { student_id, .. }
        | PostingEvent::WalletRefund { student_id, .. } => Some(*student_id),
        PostingEvent::PayrollRun { .. } | PostingEvent::ExpenseRecorded { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use scholaris_core::posting::PaymentMethod;
    use scholaris_shared::types::Amount;

    use super::*;
    use crate::entities::sea_orm_active_enums;

    fn payroll() -> PostingEvent {
        PostingEvent::PayrollRun {
            date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            period: "2025-01".into(),
            gross: Amount::new(1_000_000),
            tax: Amount::new(100_000),
            pension: Amount::new(80_000),
            other_deductions: Amount::ZERO,
            method: PaymentMethod::Bank,
        }
    }

    fn system_account(school_id: Uuid, role: SystemAccount) -> chart_of_accounts::Model {
        let now = Utc::now().into();
        chart_of_accounts::Model {
            id: Uuid::now_v7(),
            school_id,
            code: role.code().into(),
            name: role.name().into(),
            description: None,
            account_type: sea_orm_active_enums::AccountType::from(role.account_type()),
            is_active: true,
            is_system: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_payroll_has_no_student() {
        assert!(event_student(&payroll()).is_none());
    }

    #[tokio::test]
    async fn test_missing_role_is_reported() {
        let school_id = Uuid::now_v7();
        // Salary expense and bank exist; the deduction payables do not.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                system_account(school_id, SystemAccount::SalaryExpense),
                system_account(school_id, SystemAccount::Bank),
            ]])
            .into_connection();
        let repo = PostingRepository::new(Arc::new(db), LedgerSettings::default());

        let err = repo.post_event(school_id, payroll()).await.unwrap_err();
        assert!(matches!(
            err,
            PostingError::Rule(RuleError::MissingAccount(
                SystemAccount::TaxPayable | SystemAccount::PensionPayable
            ))
        ));
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 422);
    }

    #[tokio::test]
    async fn test_student_of_other_school_rejected() {
        let school_id = Uuid::now_v7();
        let student_id = StudentId::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![std::collections::BTreeMap::from([(
                "num_items".to_string(),
                sea_orm::Value::BigInt(Some(0)),
            )])]])
            .into_connection();
        let repo = PostingRepository::new(Arc::new(db), LedgerSettings::default());

        let event = PostingEvent::WalletTopUp {
            student_id,
            date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            amount: Amount::new(50_000),
            method: PaymentMethod::Cash,
        };
        let err = repo.post_event(school_id, event).await.unwrap_err();
        assert!(matches!(err, PostingError::StudentNotFound(id) if id == student_id.into_inner()));
    }
}
