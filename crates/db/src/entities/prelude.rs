//! Entity re-exports.

pub use super::account_balances::Entity as AccountBalances;
pub use super::chart_of_accounts::Entity as ChartOfAccounts;
pub use super::classes::Entity as Classes;
pub use super::exam_questions::Entity as ExamQuestions;
pub use super::exams::Entity as Exams;
pub use super::fiscal_years::Entity as FiscalYears;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::questions::Entity as Questions;
pub use super::results::Entity as Results;
pub use super::schools::Entity as Schools;
pub use super::students::Entity as Students;
pub use super::teachers::Entity as Teachers;
