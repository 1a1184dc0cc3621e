//! Finance figures for the dashboard.

use scholaris_shared::types::Amount;

use super::types::FinanceSummary;
use crate::ledger::AccountType;
use crate::posting::SystemAccount;

/// One account's numbers for the period shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFigure {
    /// System role, when the account carries a standard code.
    pub role: Option<SystemAccount>,
    /// Account type.
    pub account_type: AccountType,
    /// Change over the period, on the account's normal side.
    pub movement: Amount,
    /// Balance at the end of the period, on the account's normal side.
    pub closing: Amount,
}

impl FinanceSummary {
    /// Folds per-account figures into the dashboard totals.
    ///
    /// Revenue and expenses use period movements; cash, receivables and
    /// wallets use closing balances.
    #[must_use]
    pub fn from_figures(figures: &[AccountFigure]) -> Self {
        let movement_where = |keep: &dyn Fn(&AccountFigure) -> bool| -> Amount {
            figures.iter().filter(|f| keep(f)).map(|f| f.movement).sum()
        };
        let closing_of = |roles: &[SystemAccount]| -> Amount {
            figures
                .iter()
                .filter(|f| f.role.is_some_and(|r| roles.contains(&r)))
                .map(|f| f.closing)
                .sum()
        };

        let fee_revenue = movement_where(&|f| {
            matches!(
                f.role,
                Some(SystemAccount::TuitionRevenue | SystemAccount::OtherFeeRevenue)
            )
        });
        let revenue = movement_where(&|f| f.account_type == AccountType::Revenue);
        let expenses = movement_where(&|f| f.account_type == AccountType::Expense);

        Self {
            fee_revenue,
            expenses,
            net_surplus: Amount::new(revenue.minor().saturating_sub(expenses.minor())),
            cash_position: closing_of(&[SystemAccount::Cash, SystemAccount::Bank]),
            fees_outstanding: closing_of(&[SystemAccount::FeesReceivable]),
            wallet_liability: closing_of(&[SystemAccount::StudentWallet]),
        }
    }
}
