//! Dashboard data types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use scholaris_shared::types::{Amount, FiscalYearId, JournalEntryId};

use crate::ledger::JournalSource;

/// Dashboard response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Current fiscal year, if one is set.
    pub fiscal_year: Option<FiscalYearInfo>,
    /// People and classes.
    pub counts: HeadCounts,
    /// Money figures for the current fiscal year.
    pub finance: FinanceSummary,
    /// Latest journal entries.
    pub recent_entries: Vec<RecentEntry>,
}

/// Fiscal year the figures cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearInfo {
    /// Fiscal year ID.
    pub id: FiscalYearId,
    /// Name, e.g. "2024/2025".
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
}

/// Head counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadCounts {
    /// All teachers except unfinished drafts.
    pub teachers: u64,
    /// Teachers currently active.
    pub active_teachers: u64,
    /// Enrolled students.
    pub students: u64,
    /// Classes.
    pub classes: u64,
}

/// Finance figures, all in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceSummary {
    /// Tuition and other fee revenue.
    pub fee_revenue: Amount,
    /// All expense accounts.
    pub expenses: Amount,
    /// Revenue of every kind minus expenses.
    pub net_surplus: Amount,
    /// Cash plus bank.
    pub cash_position: Amount,
    /// Fees billed and not yet collected.
    pub fees_outstanding: Amount,
    /// Money held in student wallets.
    pub wallet_liability: Amount,
}

/// A journal entry on the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Entry number.
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narrative.
    pub description: String,
    /// Producing module.
    pub source: JournalSource,
    /// Sum of debits.
    pub total: Amount,
    /// Posted flag.
    pub is_posted: bool,
    /// Reversed flag.
    pub is_reversed: bool,
}
