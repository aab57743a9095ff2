//! Posting plan types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;
use uuid::Uuid;

use crate::ledger::types::{AccountType, EntrySource, LineAmounts};

/// Accounts the engine finds or creates by name for its own postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemAccount {
    /// Customer balances.
    AccountsReceivable,
    /// Supplier balances.
    AccountsPayable,
    /// Customer payments not yet deposited.
    UndepositedFunds,
    /// Sales tax collected.
    SalesTaxPayable,
    /// Sales tax paid on purchases.
    SalesTaxReceivable,
    /// Default income account for invoices.
    Sales,
}

impl SystemAccount {
    /// Every system account.
    pub const ALL: [Self; 6] = [
        Self::AccountsReceivable,
        Self::AccountsPayable,
        Self::UndepositedFunds,
        Self::SalesTaxPayable,
        Self::SalesTaxReceivable,
        Self::Sales,
    ];

    /// Account name used to find the account.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AccountsReceivable => "Accounts Receivable",
            Self::AccountsPayable => "Accounts Payable",
            Self::UndepositedFunds => "Undeposited Funds",
            Self::SalesTaxPayable => "GST/HST Payable",
            Self::SalesTaxReceivable => "GST/HST Receivable",
            Self::Sales => "Sales",
        }
    }

    /// Account type used when the account has to be created.
    #[must_use]
    pub const fn account_type(self) -> AccountType {
        match self {
            Self::AccountsReceivable => AccountType::AccountsReceivable,
            Self::AccountsPayable => AccountType::AccountsPayable,
            Self::UndepositedFunds | Self::SalesTaxReceivable => AccountType::OtherCurrentAssets,
            Self::SalesTaxPayable => AccountType::OtherCurrentLiabilities,
            Self::Sales => AccountType::Income,
        }
    }

    /// Detail type used when the account has to be created.
    #[must_use]
    pub const fn detail_type(self) -> &'static str {
        match self {
            Self::AccountsReceivable => "Accounts Receivable (A/R)",
            Self::AccountsPayable => "Accounts Payable (A/P)",
            Self::UndepositedFunds => "Undeposited Funds",
            Self::SalesTaxPayable | Self::SalesTaxReceivable => "Sales Tax",
            Self::Sales => "Sales of Product Income",
        }
    }
}

/// Account a planned line posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AccountRef {
    /// A concrete account chosen by the caller.
    Account(AccountId),
    /// A system account resolved at posting time.
    System(SystemAccount),
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        Self::Account(id)
    }
}

impl From<SystemAccount> for AccountRef {
    fn from(account: SystemAccount) -> Self {
        Self::System(account)
    }
}

/// A journal line whose account may still be symbolic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedLine {
    /// Target account.
    pub account: AccountRef,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
}

impl PlannedLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account: impl Into<AccountRef>, amount: Decimal) -> Self {
        Self {
            account: account.into(),
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account: impl Into<AccountRef>, amount: Decimal) -> Self {
        Self {
            account: account.into(),
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
        }
    }

    /// Sets the line memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

impl LineAmounts for PlannedLine {
    fn debit(&self) -> Decimal {
        self.debit
    }

    fn credit(&self) -> Decimal {
        self.credit
    }
}

/// A validated, balanced journal entry waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingPlan {
    /// Posting date.
    pub date: NaiveDate,
    /// Entry memo.
    pub memo: String,
    /// Origin of the entry.
    pub source: EntrySource,
    /// ID of the originating document, if any.
    pub source_id: Option<Uuid>,
    /// Lines in posting order.
    pub lines: Vec<PlannedLine>,
}

impl PostingPlan {
    /// Sum of the debit side.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// System accounts referenced by the plan, without duplicates.
    #[must_use]
    pub fn system_accounts(&self) -> Vec<SystemAccount> {
        let mut found = Vec::new();
        for line in &self.lines {
            if let AccountRef::System(account) = line.account
                && !found.contains(&account)
            {
                found.push(account);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_accounts_have_expected_types() {
        assert_eq!(SystemAccount::SalesTaxPayable.name(), "GST/HST Payable");
        assert_eq!(
            SystemAccount::UndepositedFunds.account_type(),
            AccountType::OtherCurrentAssets
        );
        assert_eq!(SystemAccount::Sales.account_type(), AccountType::Income);
    }

    #[test]
    fn test_account_ref_serializes_tagged() {
        let json = serde_json::to_value(AccountRef::System(SystemAccount::Sales)).unwrap();
        assert_eq!(json["kind"], "system");
        assert_eq!(json["value"], "sales");
    }
}
