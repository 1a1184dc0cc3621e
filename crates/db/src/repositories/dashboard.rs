//! Dashboard repository for head counts, finance figures and activity.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use scholaris_core::dashboard::{
    AccountFigure, DashboardSummary, FinanceSummary, FiscalYearInfo, HeadCounts, RecentEntry,
};
use scholaris_core::posting::SystemAccount;
use scholaris_shared::AppError;
use scholaris_shared::types::{Amount, FiscalYearId, JournalEntryId};

use super::database_error;
use crate::entities::{
    account_balances, chart_of_accounts, classes, fiscal_years, journal_entries,
    sea_orm_active_enums::TeacherStatus, students, teachers,
};

const RECENT_ENTRIES: u64 = 10;

/// Error types for dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Database(e) => database_error(&e),
        }
    }
}

/// Dashboard repository.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: Arc<DatabaseConnection>,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Builds the dashboard as of `today`.
    ///
    /// Finance figures cover the current fiscal year up to `today` (or its
    /// end date, if earlier). Without a current year they cover all history.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn summary(
        &self,
        school_id: Uuid,
        today: NaiveDate,
    ) -> Result<DashboardSummary, DashboardError> {
        let fiscal_year = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::SchoolId.eq(school_id))
            .filter(fiscal_years::Column::IsCurrent.eq(true))
            .one(self.db.as_ref())
            .await?;

        let (period_start, as_of) = fiscal_year
            .as_ref()
            .map_or((None, today), |fy| (Some(fy.start_date), today.min(fy.end_date)));

        let counts = self.head_counts(school_id).await?;
        let finance = self.finance(school_id, period_start, as_of).await?;
        let recent_entries = self.recent_entries(school_id).await?;

        Ok(DashboardSummary {
            fiscal_year: fiscal_year.map(|fy| FiscalYearInfo {
                id: FiscalYearId::from_uuid(fy.id),
                name: fy.name,
                start_date: fy.start_date,
                end_date: fy.end_date,
            }),
            counts,
            finance,
            recent_entries,
        })
    }

    async fn head_counts(&self, school_id: Uuid) -> Result<HeadCounts, DashboardError> {
        let teachers = teachers::Entity::find()
            .filter(teachers::Column::SchoolId.eq(school_id))
            .filter(teachers::Column::Status.ne(TeacherStatus::Draft))
            .count(self.db.as_ref())
            .await?;
        let active_teachers = teachers::Entity::find()
            .filter(teachers::Column::SchoolId.eq(school_id))
            .filter(teachers::Column::Status.eq(TeacherStatus::Active))
            .count(self.db.as_ref())
            .await?;
        let students = students::Entity::find()
            .filter(students::Column::SchoolId.eq(school_id))
            .filter(students::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await?;
        let classes = classes::Entity::find()
            .filter(classes::Column::SchoolId.eq(school_id))
            .count(self.db.as_ref())
            .await?;

        Ok(HeadCounts {
            teachers,
            active_teachers,
            students,
            classes,
        })
    }

    async fn finance(
        &self,
        school_id: Uuid,
        period_start: Option<NaiveDate>,
        as_of: NaiveDate,
    ) -> Result<FinanceSummary, DashboardError> {
        let accounts = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .all(self.db.as_ref())
            .await?;
        let rows = account_balances::Entity::find()
            .filter(account_balances::Column::SchoolId.eq(school_id))
            .filter(account_balances::Column::BalanceDate.lte(as_of))
            .order_by_asc(account_balances::Column::AccountId)
            .order_by_desc(account_balances::Column::BalanceDate)
            .all(self.db.as_ref())
            .await?;

        Ok(FinanceSummary::from_figures(&account_figures(
            &accounts,
            &rows,
            period_start,
        )))
    }

    async fn recent_entries(&self, school_id: Uuid) -> Result<Vec<RecentEntry>, DashboardError> {
        let entries = journal_entries::Entity::find()
            .filter(journal_entries::Column::SchoolId.eq(school_id))
            .order_by_desc(journal_entries::Column::CreatedAt)
            .limit(RECENT_ENTRIES)
            .all(self.db.as_ref())
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| RecentEntry {
                id: JournalEntryId::from_uuid(e.id),
                entry_number: e.entry_number,
                entry_date: e.entry_date,
                description: e.description,
                source: e.source.into(),
                total: Amount::new(e.total_debit),
                is_posted: e.is_posted,
                is_reversed: e.is_reversed,
            })
            .collect())
    }
}

/// Turns balance rows (at most `as_of`, any order) into per-account
/// figures. The movement is the closing balance less the last balance
/// before `period_start`.
fn account_figures(
    accounts: &[chart_of_accounts::Model],
    rows: &[account_balances::Model],
    period_start: Option<NaiveDate>,
) -> Vec<AccountFigure> {
    // (date, balance) of the latest row overall and before the period.
    let mut closing: HashMap<Uuid, (NaiveDate, i64)> = HashMap::new();
    let mut opening: HashMap<Uuid, (NaiveDate, i64)> = HashMap::new();
    for row in rows {
        keep_latest(&mut closing, row);
        if period_start.is_some_and(|start| row.balance_date < start) {
            keep_latest(&mut opening, row);
        }
    }

    accounts
        .iter()
        .map(|account| {
            let closing = closing.get(&account.id).map_or(0, |(_, b)| *b);
            let opening = opening.get(&account.id).map_or(0, |(_, b)| *b);
            AccountFigure {
                role: SystemAccount::from_code(&account.code),
                account_type: account.account_type.into(),
                movement: Amount::new(closing.saturating_sub(opening)),
                closing: Amount::new(closing),
            }
        })
        .collect()
}

fn keep_latest(latest: &mut HashMap<Uuid, (NaiveDate, i64)>, row: &account_balances::Model) {
    let slot = latest
        .entry(row.account_id)
        .or_insert((row.balance_date, row.balance));
    if row.balance_date > slot.0 {
        *slot = (row.balance_date, row.balance);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::entities::sea_orm_active_enums::AccountType;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn account(school_id: Uuid, role: SystemAccount) -> chart_of_accounts::Model {
        let now = Utc::now().into();
        chart_of_accounts::Model {
            id: Uuid::now_v7(),
            school_id,
            code: role.code().into(),
            name: role.name().into(),
            description: None,
            account_type: AccountType::from(role.account_type()),
            is_active: true,
            is_system: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn balance(account: &chart_of_accounts::Model, on: NaiveDate, amount: i64) -> account_balances::Model {
        account_balances::Model {
            id: Uuid::now_v7(),
            school_id: account.school_id,
            account_id: account.id,
            balance_date: on,
            balance: amount,
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_movement_is_closing_less_opening() {
        let school_id = Uuid::now_v7();
        let tuition = account(school_id, SystemAccount::TuitionRevenue);
        let rows = vec![
            balance(&tuition, date(3, 1), 400_000),
            balance(&tuition, date(8, 31), 700_000),
            balance(&tuition, date(10, 15), 950_000),
        ];

        let figures = account_figures(&[tuition], &rows, Some(date(9, 1)));
        assert_eq!(figures[0].role, Some(SystemAccount::TuitionRevenue));
        assert_eq!(figures[0].closing, Amount::new(950_000));
        assert_eq!(figures[0].movement, Amount::new(250_000));
    }

    #[test]
    fn test_without_period_movement_is_whole_history() {
        let school_id = Uuid::now_v7();
        let cash = account(school_id, SystemAccount::Cash);
        let rows = vec![balance(&cash, date(2, 1), 30_000), balance(&cash, date(1, 5), 10_000)];

        let figures = account_figures(&[cash], &rows, None);
        assert_eq!(figures[0].closing, Amount::new(30_000));
        assert_eq!(figures[0].movement, Amount::new(30_000));
    }

    #[tokio::test]
    async fn test_empty_school_summary() {
        let school_id = Uuid::now_v7();
        let count = |n: i64| {
            vec![std::collections::BTreeMap::from([(
                "num_items".to_string(),
                sea_orm::Value::BigInt(Some(n)),
            )])]
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<fiscal_years::Model>::new()])
            .append_query_results([count(0), count(0), count(0), count(0)])
            .append_query_results([Vec::<chart_of_accounts::Model>::new()])
            .append_query_results([Vec::<account_balances::Model>::new()])
            .append_query_results([Vec::<journal_entries::Model>::new()])
            .into_connection();
        let repo = DashboardRepository::new(Arc::new(db));

        let summary = repo.summary(school_id, date(10, 1)).await.unwrap();
        assert!(summary.fiscal_year.is_none());
        assert_eq!(summary.counts, HeadCounts::default());
        assert_eq!(summary.finance, FinanceSummary::default());
        assert!(summary.recent_entries.is_empty());
    }
}
