//! Journal repository: the only path that writes ledger lines and balances.
//!
//! Every write runs in one database transaction with the school's RLS
//! context set. Validation happens before the first insert, so an unbalanced
//! or otherwise invalid entry never touches the tables.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::fiscal::{FiscalRuleError, FiscalYearWindow, check_posting_allowed};
use scholaris_core::ledger::{
    AccountInfo, AccountType, EntryState, JournalLine, JournalSource, LedgerError, LedgerService,
    NewJournalEntry, ReversalService, RunningBalance, balance_deltas, format_entry_number,
};
use scholaris_shared::types::{AccountId, Amount, PageRequest, PageResponse, SchoolId};
use scholaris_shared::{AppError, LedgerConfig};

use super::{database_error, domain_error};
use crate::entities::{
    account_balances, chart_of_accounts, fiscal_years, journal_entries, ledger_entries,
    sea_orm_active_enums,
};
use crate::rls::RlsConnection;

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Journal entry not found in this school.
    #[error("Journal entry not found: {0}")]
    NotFound(Uuid),

    /// Bookkeeping rule violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Fiscal year rule violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalRuleError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::NotFound(_) => Self::NotFound(err.to_string()),
            JournalError::Ledger(e) => domain_error(e.http_status_code(), e.to_string()),
            JournalError::Fiscal(e) => domain_error(e.http_status_code(), e.to_string()),
            JournalError::Database(e) => database_error(&e),
        }
    }
}

/// Numbering and tolerance settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Largest allowed gap between debits and credits, in minor units.
    pub tolerance_minor: u64,
    /// Entry number prefix.
    pub entry_number_prefix: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            tolerance_minor: u64::try_from(config.rounding_tolerance_minor).unwrap_or(0),
            entry_number_prefix: config.entry_number_prefix.clone(),
        }
    }
}

/// Filter options for listing journal entries.
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    /// Entries on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Entries on or before this date.
    pub date_to: Option<NaiveDate>,
    /// Producing module.
    pub source: Option<JournalSource>,
    /// Posted or draft only.
    pub is_posted: Option<bool>,
}

/// Editable fields of a draft entry.
#[derive(Debug, Clone, Default)]
pub struct UpdateDraftInput {
    /// New narrative.
    pub description: Option<String>,
    /// New reference; `Some(None)` clears it.
    pub reference: Option<Option<String>>,
}

/// Journal entry header with its lines.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JournalEntryWithLines {
    /// Header.
    #[serde(flatten)]
    pub entry: journal_entries::Model,
    /// Lines in line-number order.
    pub lines: Vec<ledger_entries::Model>,
}

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: Arc<DatabaseConnection>,
    settings: LedgerSettings,
}

impl JournalRepository {
    /// Creates a journal repository with default ledger settings.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self::with_settings(db, LedgerSettings::default())
    }

    /// Creates a journal repository with explicit settings.
    #[must_use]
    pub const fn with_settings(db: Arc<DatabaseConnection>, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Validates, numbers and writes an entry, posting it when `input.post`
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns a ledger error for invalid lines or accounts, a fiscal error
    /// when no open fiscal year covers the date, or a database error. Nothing
    /// is written on error.
    pub async fn create_entry(
        &self,
        input: NewJournalEntry,
    ) -> Result<JournalEntryWithLines, JournalError> {
        let school_id = input.school_id.into_inner();
        let rls = RlsConnection::new(self.db.as_ref(), school_id).await?;

        let created = self
            .write_entry(rls.transaction(), &input, None)
            .await
            .inspect_err(|e| warn!(%school_id, error = %e, "Journal entry rejected"))?;

        rls.commit().await?;
        info!(
            %school_id,
            entry_id = %created.entry.id,
            entry_number = %created.entry.entry_number,
            posted = created.entry.is_posted,
            "Journal entry created"
        );
        Ok(created)
    }

    /// Posts a draft entry and applies its balances.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AlreadyPosted`, a fiscal error if the year is
    /// closed, or an account error if an account was deactivated since the
    /// draft was written.
    pub async fn post_entry(
        &self,
        school_id: Uuid,
        entry_id: Uuid,
    ) -> Result<JournalEntryWithLines, JournalError> {
        let rls = RlsConnection::new(self.db.as_ref(), school_id).await?;
        let txn = rls.transaction();

        // A concurrent post waits here and then sees the entry as posted.
        let entry = lock_entry(txn, school_id, entry_id).await?;
        entry_state(&entry).can_post()?;

        let lines = find_lines(txn, entry.id).await?;
        let journal_lines: Vec<JournalLine> = lines.iter().map(to_journal_line).collect();
        let check = NewJournalEntry {
            school_id: SchoolId::from_uuid(school_id),
            entry_date: entry.entry_date,
            description: entry.description.clone(),
            reference: entry.reference.clone(),
            source: entry.source.into(),
            lines: journal_lines,
            post: true,
        };
        let accounts = load_accounts(txn, school_id, &check.lines).await?;
        LedgerService::validate_entry(&check, self.settings.tolerance_minor, |id| {
            accounts.get(&id).copied()
        })?;

        let year = fiscal_years::Entity::find_by_id(entry.fiscal_year_id)
            .filter(fiscal_years::Column::SchoolId.eq(school_id))
            .lock_shared()
            .one(txn)
            .await?
            .ok_or(FiscalRuleError::NoFiscalYear(entry.entry_date))?;
        check_posting_allowed(&window(&year), entry.entry_date)?;

        apply_balances(txn, school_id, entry.entry_date, &check.lines, &accounts).await?;

        let mut active: journal_entries::ActiveModel = entry.into();
        let now = Utc::now().into();
        active.is_posted = Set(true);
        active.posted_at = Set(Some(now));
        active.updated_at = Set(now);
        let entry = active.update(txn).await?;

        rls.commit().await?;
        info!(%school_id, %entry_id, "Journal entry posted");
        Ok(JournalEntryWithLines { entry, lines })
    }

    /// Reverses a posted entry with a new posted entry whose lines swap
    /// debit and credit, and links the two.
    ///
    /// The reversal is dated `date`, or the original entry date when absent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotPosted`, `AlreadyReversed`,
    /// `CannotReverseReversal`, or a fiscal error for the reversal date.
    pub async fn reverse_entry(
        &self,
        school_id: Uuid,
        entry_id: Uuid,
        reason: &str,
        date: Option<NaiveDate>,
    ) -> Result<JournalEntryWithLines, JournalError> {
        let rls = RlsConnection::new(self.db.as_ref(), school_id).await?;
        let txn = rls.transaction();

        let original = lock_entry(txn, school_id, entry_id).await?;
        entry_state(&original).can_reverse()?;

        let lines: Vec<JournalLine> = find_lines(txn, original.id)
            .await?
            .iter()
            .map(to_journal_line)
            .collect();
        let plan = ReversalService::plan(
            &original.entry_number,
            original.reference.as_deref(),
            reason,
            &lines,
        );
        let input = NewJournalEntry {
            school_id: SchoolId::from_uuid(school_id),
            entry_date: date.unwrap_or(original.entry_date),
            description: plan.description,
            reference: plan.reference,
            source: JournalSource::Reversal,
            lines: plan.lines,
            post: true,
        };
        let reversal = self.write_entry(txn, &input, Some(original.id)).await?;

        let mut active: journal_entries::ActiveModel = original.into();
        active.is_reversed = Set(true);
        active.reversed_by_id = Set(Some(reversal.entry.id));
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;

        rls.commit().await?;
        info!(
            %school_id,
            %entry_id,
            reversal_id = %reversal.entry.id,
            "Journal entry reversed"
        );
        Ok(reversal)
    }

    /// Gets an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entry does not belong to the school.
    pub async fn get_entry(
        &self,
        school_id: Uuid,
        entry_id: Uuid,
    ) -> Result<JournalEntryWithLines, JournalError> {
        let entry = find_entry(self.db.as_ref(), school_id, entry_id).await?;
        let lines = find_lines(self.db.as_ref(), entry.id).await?;
        Ok(JournalEntryWithLines { entry, lines })
    }

    /// Lists entry headers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_entries(
        &self,
        school_id: Uuid,
        filter: JournalFilter,
        page: PageRequest,
    ) -> Result<PageResponse<journal_entries::Model>, JournalError> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::SchoolId.eq(school_id));

        if let Some(date_from) = filter.date_from {
            query = query.filter(journal_entries::Column::EntryDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(journal_entries::Column::EntryDate.lte(date_to));
        }
        if let Some(source) = filter.source {
            query = query.filter(
                journal_entries::Column::Source.eq(sea_orm_active_enums::JournalSource::from(source)),
            );
        }
        if let Some(is_posted) = filter.is_posted {
            query = query.filter(journal_entries::Column::IsPosted.eq(is_posted));
        }

        let total = query.clone().count(self.db.as_ref()).await?;
        let entries = query
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::Sequence)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await?;

        Ok(PageResponse::new(entries, page.page, page.per_page, total))
    }

    /// Edits the description or reference of a draft.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `CannotModifyPosted` or `EmptyDescription`.
    pub async fn update_draft(
        &self,
        school_id: Uuid,
        entry_id: Uuid,
        input: UpdateDraftInput,
    ) -> Result<journal_entries::Model, JournalError> {
        let entry = find_entry(self.db.as_ref(), school_id, entry_id).await?;
        entry_state(&entry).can_edit()?;

        let mut active: journal_entries::ActiveModel = entry.into();
        if let Some(description) = input.description {
            if description.trim().is_empty() {
                return Err(LedgerError::EmptyDescription.into());
            }
            active.description = Set(description);
        }
        if let Some(reference) = input.reference {
            active.reference = Set(reference);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(self.db.as_ref()).await?;
        info!(%school_id, %entry_id, "Journal draft updated");
        Ok(updated)
    }

    /// Deletes a draft entry and its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `CanOnlyDeleteDraft`.
    pub async fn delete_entry(&self, school_id: Uuid, entry_id: Uuid) -> Result<(), JournalError> {
        let entry = find_entry(self.db.as_ref(), school_id, entry_id).await?;
        entry_state(&entry).can_delete()?;

        let deleted = journal_entries::Entity::delete_many()
            .filter(journal_entries::Column::Id.eq(entry.id))
            .filter(journal_entries::Column::SchoolId.eq(school_id))
            .filter(journal_entries::Column::IsPosted.eq(false))
            .exec(self.db.as_ref())
            .await?;
        if deleted.rows_affected == 0 {
            // Posted between the read and the delete.
            return Err(LedgerError::CanOnlyDeleteDraft.into());
        }

        info!(%school_id, %entry_id, "Journal draft deleted");
        Ok(())
    }

    /// Validation, numbering and inserts shared by create and reverse.
    async fn write_entry(
        &self,
        txn: &DatabaseTransaction,
        input: &NewJournalEntry,
        reversal_of: Option<Uuid>,
    ) -> Result<JournalEntryWithLines, JournalError> {
        let school_id = input.school_id.into_inner();

        let accounts = load_accounts(txn, school_id, &input.lines).await?;
        let totals = LedgerService::validate_entry(input, self.settings.tolerance_minor, |id| {
            accounts.get(&id).copied()
        })?;

        let year = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::SchoolId.eq(school_id))
            .filter(fiscal_years::Column::StartDate.lte(input.entry_date))
            .filter(fiscal_years::Column::EndDate.gte(input.entry_date))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(FiscalRuleError::NoFiscalYear(input.entry_date))?;
        check_posting_allowed(&window(&year), input.entry_date)?;

        // Numbering is serialised by the lock on the fiscal year row.
        let sequence = next_sequence(txn, school_id, year.id).await?;
        let entry_number = format_entry_number(
            &self.settings.entry_number_prefix,
            year.start_date.year(),
            sequence,
        );

        let now = Utc::now().into();
        let entry = journal_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            fiscal_year_id: Set(year.id),
            entry_number: Set(entry_number),
            sequence: Set(sequence),
            entry_date: Set(input.entry_date),
            description: Set(input.description.trim().to_string()),
            reference: Set(input.reference.clone()),
            source: Set(input.source.into()),
            total_debit: Set(totals.debit.minor()),
            total_credit: Set(totals.credit.minor()),
            is_posted: Set(input.post),
            posted_at: Set(input.post.then_some(now)),
            is_reversed: Set(false),
            reversal_of_id: Set(reversal_of),
            reversed_by_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for (index, line) in input.lines.iter().enumerate() {
            let inserted = ledger_entries::ActiveModel {
                id: Set(Uuid::now_v7()),
                school_id: Set(school_id),
                journal_entry_id: Set(entry.id),
                account_id: Set(line.account_id.into_inner()),
                line_number: Set(i32::try_from(index + 1).unwrap_or(i32::MAX)),
                debit: Set(line.debit.minor()),
                credit: Set(line.credit.minor()),
                description: Set(line.description.clone()),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
            lines.push(inserted);
        }

        if input.post {
            apply_balances(txn, school_id, input.entry_date, &input.lines, &accounts).await?;
        }

        Ok(JournalEntryWithLines { entry, lines })
    }
}

/// Loads and row-locks the school's accounts referenced by `lines`.
///
/// Locks are taken in id order and held until the transaction ends, so
/// writers touching the same accounts apply their balances one at a time.
/// Accounts of other schools are simply absent from the map, so they fail
/// validation as not found.
async fn load_accounts(
    txn: &DatabaseTransaction,
    school_id: Uuid,
    lines: &[JournalLine],
) -> Result<HashMap<AccountId, AccountInfo>, DbErr> {
    let mut ids: Vec<Uuid> = lines.iter().map(|l| l.account_id.into_inner()).collect();
    ids.sort_unstable();
    ids.dedup();

    let accounts = chart_of_accounts::Entity::find()
        .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
        .filter(chart_of_accounts::Column::Id.is_in(ids))
        .order_by_asc(chart_of_accounts::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await?;

    Ok(accounts
        .into_iter()
        .map(|a| {
            let id = AccountId::from_uuid(a.id);
            let info = AccountInfo {
                id,
                account_type: AccountType::from(a.account_type),
                is_active: a.is_active,
            };
            (id, info)
        })
        .collect())
}

async fn find_entry<C>(
    conn: &C,
    school_id: Uuid,
    entry_id: Uuid,
) -> Result<journal_entries::Model, JournalError>
where
    C: sea_orm::ConnectionTrait,
{
    journal_entries::Entity::find_by_id(entry_id)
        .filter(journal_entries::Column::SchoolId.eq(school_id))
        .one(conn)
        .await?
        .ok_or(JournalError::NotFound(entry_id))
}

/// Reads an entry with `FOR UPDATE`, so state checks made on it hold until
/// the transaction ends.
async fn lock_entry(
    txn: &DatabaseTransaction,
    school_id: Uuid,
    entry_id: Uuid,
) -> Result<journal_entries::Model, JournalError> {
    journal_entries::Entity::find_by_id(entry_id)
        .filter(journal_entries::Column::SchoolId.eq(school_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(JournalError::NotFound(entry_id))
}

async fn find_lines<C>(conn: &C, entry_id: Uuid) -> Result<Vec<ledger_entries::Model>, DbErr>
where
    C: sea_orm::ConnectionTrait,
{
    ledger_entries::Entity::find()
        .filter(ledger_entries::Column::JournalEntryId.eq(entry_id))
        .order_by_asc(ledger_entries::Column::LineNumber)
        .all(conn)
        .await
}

async fn next_sequence(
    txn: &DatabaseTransaction,
    school_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<i64, DbErr> {
    let max: Option<Option<i64>> = journal_entries::Entity::find()
        .select_only()
        .column_as(journal_entries::Column::Sequence.max(), "max_sequence")
        .filter(journal_entries::Column::SchoolId.eq(school_id))
        .filter(journal_entries::Column::FiscalYearId.eq(fiscal_year_id))
        .into_tuple()
        .one(txn)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

/// Applies the per-account deltas of `lines` at `date`.
///
/// Every row dated on or after `date` moves by the delta in SQL, so
/// back-dated entries keep the running balances consistent. When the
/// account has no row at `date` yet, one is created from the latest
/// earlier balance. Callers hold the account locks from [`load_accounts`].
async fn apply_balances(
    txn: &DatabaseTransaction,
    school_id: Uuid,
    date: NaiveDate,
    lines: &[JournalLine],
    accounts: &HashMap<AccountId, AccountInfo>,
) -> Result<(), JournalError> {
    let deltas = balance_deltas(lines, |id| accounts.get(&id).map(|a| a.account_type))?;
    let now = Utc::now();

    for (account_id, delta) in deltas {
        if delta.is_zero() {
            continue;
        }
        let account_uuid = account_id.into_inner();

        let has_same_day = account_balances::Entity::find()
            .filter(account_balances::Column::SchoolId.eq(school_id))
            .filter(account_balances::Column::AccountId.eq(account_uuid))
            .filter(account_balances::Column::BalanceDate.eq(date))
            .count(txn)
            .await?
            > 0;

        account_balances::Entity::update_many()
            .col_expr(
                account_balances::Column::Balance,
                Expr::col(account_balances::Column::Balance).add(delta.minor()),
            )
            .col_expr(account_balances::Column::UpdatedAt, Expr::value(now))
            .filter(account_balances::Column::SchoolId.eq(school_id))
            .filter(account_balances::Column::AccountId.eq(account_uuid))
            .filter(account_balances::Column::BalanceDate.gte(date))
            .exec(txn)
            .await?;

        if !has_same_day {
            let previous = account_balances::Entity::find()
                .filter(account_balances::Column::SchoolId.eq(school_id))
                .filter(account_balances::Column::AccountId.eq(account_uuid))
                .filter(account_balances::Column::BalanceDate.lt(date))
                .order_by_desc(account_balances::Column::BalanceDate)
                .one(txn)
                .await?
                .map_or(Amount::ZERO, |row| Amount::new(row.balance));
            let current = checked_apply(RunningBalance::opening(previous), delta)?;
            account_balances::ActiveModel {
                id: Set(Uuid::now_v7()),
                school_id: Set(school_id),
                account_id: Set(account_uuid),
                balance_date: Set(date),
                balance: Set(current.minor()),
                updated_at: Set(now.into()),
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}

fn checked_apply(running: RunningBalance, delta: Amount) -> Result<Amount, LedgerError> {
    running
        .current
        .checked_add(delta)
        .ok_or(LedgerError::AmountOverflow)
}

fn to_journal_line(model: &ledger_entries::Model) -> JournalLine {
    JournalLine {
        account_id: AccountId::from_uuid(model.account_id),
        debit: Amount::new(model.debit),
        credit: Amount::new(model.credit),
        description: model.description.clone(),
    }
}

const fn entry_state(entry: &journal_entries::Model) -> EntryState {
    EntryState {
        is_posted: entry.is_posted,
        is_reversed: entry.is_reversed,
        is_reversal: entry.reversal_of_id.is_some(),
    }
}

pub(crate) const fn window(year: &fiscal_years::Model) -> FiscalYearWindow {
    FiscalYearWindow {
        start: year.start_date,
        end: year.end_date,
        is_closed: year.is_closed,
    }
}
