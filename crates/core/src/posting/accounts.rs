//! System account roles and their standard chart codes.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use scholaris_shared::types::AccountId;

use crate::ledger::AccountType;

/// An account the posting rules need, identified by role rather than id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemAccount {
    /// Cash on hand.
    Cash,
    /// School bank account.
    Bank,
    /// Fees billed but not yet paid.
    FeesReceivable,
    /// Money students hold in their wallets.
    StudentWallet,
    /// Salary deductions owed to third parties.
    SalariesPayable,
    /// Withheld income tax.
    TaxPayable,
    /// Withheld pension contributions.
    PensionPayable,
    /// Supplier balances.
    AccountsPayable,
    /// Accumulated surplus.
    RetainedEarnings,
    /// Tuition income.
    TuitionRevenue,
    /// Non-tuition fee income.
    OtherFeeRevenue,
    /// Sales paid from student wallets.
    WalletRevenue,
    /// Gross salaries.
    SalaryExpense,
    /// Default expense account.
    GeneralExpense,
}

impl SystemAccount {
    /// Every role, in chart order.
    pub const ALL: [Self; 14] = [
        Self::Cash,
        Self::Bank,
        Self::FeesReceivable,
        Self::StudentWallet,
        Self::SalariesPayable,
        Self::TaxPayable,
        Self::PensionPayable,
        Self::AccountsPayable,
        Self::RetainedEarnings,
        Self::TuitionRevenue,
        Self::OtherFeeRevenue,
        Self::WalletRevenue,
        Self::SalaryExpense,
        Self::GeneralExpense,
    ];

    /// Standard account code in a seeded chart of accounts.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Cash => "1000",
            Self::Bank => "1010",
            Self::FeesReceivable => "1100",
            Self::StudentWallet => "2100",
            Self::SalariesPayable => "2200",
            Self::TaxPayable => "2210",
            Self::PensionPayable => "2220",
            Self::AccountsPayable => "2300",
            Self::RetainedEarnings => "3000",
            Self::TuitionRevenue => "4000",
            Self::OtherFeeRevenue => "4100",
            Self::WalletRevenue => "4200",
            Self::SalaryExpense => "5000",
            Self::GeneralExpense => "5100",
        }
    }

    /// Default account name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cash => "Cash on Hand",
            Self::Bank => "Bank",
            Self::FeesReceivable => "Fees Receivable",
            Self::StudentWallet => "Student Wallet Deposits",
            Self::SalariesPayable => "Salaries Payable",
            Self::TaxPayable => "Tax Payable",
            Self::PensionPayable => "Pension Payable",
            Self::AccountsPayable => "Accounts Payable",
            Self::RetainedEarnings => "Retained Earnings",
            Self::TuitionRevenue => "Tuition Revenue",
            Self::OtherFeeRevenue => "Other Fee Revenue",
            Self::WalletRevenue => "Wallet Sales Revenue",
            Self::SalaryExpense => "Salary Expense",
            Self::GeneralExpense => "General Expense",
        }
    }

    /// Classification of the account.
    #[must_use]
    pub const fn account_type(self) -> AccountType {
        match self {
            Self::Cash | Self::Bank | Self::FeesReceivable => AccountType::Asset,
            Self::StudentWallet
            | Self::SalariesPayable
            | Self::TaxPayable
            | Self::PensionPayable
            | Self::AccountsPayable => AccountType::Liability,
            Self::RetainedEarnings => AccountType::Equity,
            Self::TuitionRevenue | Self::OtherFeeRevenue | Self::WalletRevenue => {
                AccountType::Revenue
            }
            Self::SalaryExpense | Self::GeneralExpense => AccountType::Expense,
        }
    }

    /// Looks up the role that owns a standard code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.code() == code)
    }
}

impl fmt::Display for SystemAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Resolves system account roles to a school's accounts.
#[cfg_attr(test, mockall::automock)]
pub trait AccountResolver {
    /// Returns the school's account for `role`, if it has one.
    fn resolve(&self, role: SystemAccount) -> Option<AccountId>;
}

impl AccountResolver for HashMap<SystemAccount, AccountId> {
    fn resolve(&self, role: SystemAccount) -> Option<AccountId> {
        self.get(&role).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<_> = SystemAccount::ALL.iter().map(|r| r.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), SystemAccount::ALL.len());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(SystemAccount::from_code("2100"), Some(SystemAccount::StudentWallet));
        assert_eq!(SystemAccount::from_code("9999"), None);
    }

    #[test]
    fn test_wallet_is_a_liability() {
        assert_eq!(SystemAccount::StudentWallet.account_type(), AccountType::Liability);
    }

    #[test]
    fn test_display_mentions_code() {
        assert_eq!(SystemAccount::Cash.to_string(), "Cash on Hand (1000)");
    }
}
