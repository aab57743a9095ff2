//! Ledger domain types for journal entry creation and validation.
//!
//! This module defines the core types used for creating and validating
//! journal entries in the double-entry bookkeeping system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::error::LedgerError;

/// Chart of accounts type.
///
/// The type decides which side increases the balance and where the account
/// lands on the Profit & Loss or balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Bank and cash accounts.
    #[serde(rename = "Bank")]
    Bank,
    /// Money owed by customers.
    #[serde(rename = "Accounts Receivable")]
    AccountsReceivable,
    /// Undeposited funds, tax receivable, prepaid items.
    #[serde(rename = "Other Current Assets")]
    OtherCurrentAssets,
    /// Equipment, vehicles, buildings.
    #[serde(rename = "Fixed Assets")]
    FixedAssets,
    /// Long-lived assets that are not fixed assets.
    #[serde(rename = "Other Assets")]
    OtherAssets,
    /// Money owed to suppliers.
    #[serde(rename = "Accounts Payable")]
    AccountsPayable,
    /// Credit card balances.
    #[serde(rename = "Credit Card")]
    CreditCard,
    /// Sales tax payable, payroll liabilities.
    #[serde(rename = "Other Current Liabilities")]
    OtherCurrentLiabilities,
    /// Loans due after one year.
    #[serde(rename = "Long Term Liabilities")]
    LongTermLiabilities,
    /// Owner's equity.
    #[serde(rename = "Equity")]
    Equity,
    /// Operating income.
    #[serde(rename = "Income")]
    Income,
    /// Interest and other non-operating income.
    #[serde(rename = "Other Income")]
    OtherIncome,
    /// Direct costs of sales.
    #[serde(rename = "Cost of Goods Sold")]
    CostOfGoodsSold,
    /// Operating expenses.
    #[serde(rename = "Expense", alias = "Expenses")]
    Expense,
    /// Non-operating expenses.
    #[serde(rename = "Other Expense", alias = "Other Expenses")]
    OtherExpense,
}

/// Statement an account type reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    /// Balance sheet asset.
    Asset,
    /// Balance sheet liability.
    Liability,
    /// Balance sheet equity.
    Equity,
    /// Profit & Loss income.
    Income,
    /// Profit & Loss expense (including cost of goods sold).
    Expense,
}

/// Side that increases an account's balance.
///
/// - Assets and expenses: balance += debit - credit (debit-normal)
/// - Liabilities, equity, and income: balance += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change for a debit/credit pair.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

impl AccountType {
    /// Every account type, in chart-of-accounts order.
    pub const ALL: [Self; 15] = [
        Self::Bank,
        Self::AccountsReceivable,
        Self::OtherCurrentAssets,
        Self::FixedAssets,
        Self::OtherAssets,
        Self::AccountsPayable,
        Self::CreditCard,
        Self::OtherCurrentLiabilities,
        Self::LongTermLiabilities,
        Self::Equity,
        Self::Income,
        Self::OtherIncome,
        Self::CostOfGoodsSold,
        Self::Expense,
        Self::OtherExpense,
    ];

    /// Returns the display label, which is also the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::AccountsReceivable => "Accounts Receivable",
            Self::OtherCurrentAssets => "Other Current Assets",
            Self::FixedAssets => "Fixed Assets",
            Self::OtherAssets => "Other Assets",
            Self::AccountsPayable => "Accounts Payable",
            Self::CreditCard => "Credit Card",
            Self::OtherCurrentLiabilities => "Other Current Liabilities",
            Self::LongTermLiabilities => "Long Term Liabilities",
            Self::Equity => "Equity",
            Self::Income => "Income",
            Self::OtherIncome => "Other Income",
            Self::CostOfGoodsSold => "Cost of Goods Sold",
            Self::Expense => "Expense",
            Self::OtherExpense => "Other Expense",
        }
    }

    /// Returns the report category of this account type.
    #[must_use]
    pub const fn category(self) -> AccountCategory {
        match self {
            Self::Bank
            | Self::AccountsReceivable
            | Self::OtherCurrentAssets
            | Self::FixedAssets
            | Self::OtherAssets => AccountCategory::Asset,
            Self::AccountsPayable
            | Self::CreditCard
            | Self::OtherCurrentLiabilities
            | Self::LongTermLiabilities => AccountCategory::Liability,
            Self::Equity => AccountCategory::Equity,
            Self::Income | Self::OtherIncome => AccountCategory::Income,
            Self::CostOfGoodsSold | Self::Expense | Self::OtherExpense => {
                AccountCategory::Expense
            }
        }
    }

    /// Returns the side that increases this account's balance.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self.category() {
            AccountCategory::Asset | AccountCategory::Expense => NormalBalance::Debit,
            AccountCategory::Liability | AccountCategory::Equity | AccountCategory::Income => {
                NormalBalance::Credit
            }
        }
    }

    /// Returns true for accounts that can receive bank statement imports.
    #[must_use]
    pub const fn is_bank_like(self) -> bool {
        matches!(self, Self::Bank | Self::CreditCard)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let normalized = wanted.to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "expenses" => return Ok(Self::Expense),
            "other expenses" => return Ok(Self::OtherExpense),
            "cogs" => return Ok(Self::CostOfGoodsSold),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == normalized)
            .ok_or_else(|| LedgerError::UnknownAccountType(wanted.to_string()))
    }
}

/// Origin of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Invoice issued to a customer.
    Invoice,
    /// Customer payment against an invoice.
    Payment,
    /// Undeposited customer funds moved to the bank.
    Deposit,
    /// Expense or cheque paid immediately.
    Expense,
    /// Supplier bill recorded on account.
    Bill,
    /// Payment of a supplier bill.
    BillPayment,
    /// Transfer between two balance sheet accounts.
    Transfer,
    /// Categorized bank statement line.
    BankTransaction,
    /// Manual journal adjustment.
    ManualAdjustment,
    /// Reversal of another entry.
    Reversal,
}

impl EntrySource {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Payment => "payment",
            Self::Deposit => "deposit",
            Self::Expense => "expense",
            Self::Bill => "bill",
            Self::BillPayment => "bill_payment",
            Self::Transfer => "transfer",
            Self::BankTransaction => "bank_transaction",
            Self::ManualAdjustment => "manual_adjustment",
            Self::Reversal => "reversal",
        }
    }
}

impl std::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntrySource {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(Self::Invoice),
            "payment" => Ok(Self::Payment),
            "deposit" => Ok(Self::Deposit),
            "expense" => Ok(Self::Expense),
            "bill" => Ok(Self::Bill),
            "bill_payment" => Ok(Self::BillPayment),
            "transfer" => Ok(Self::Transfer),
            "bank_transaction" => Ok(Self::BankTransaction),
            "manual_adjustment" => Ok(Self::ManualAdjustment),
            "reversal" => Ok(Self::Reversal),
            other => Err(LedgerError::UnknownEntrySource(other.to_string())),
        }
    }
}

/// Amount carrier shared by resolved and planned journal lines.
pub trait LineAmounts {
    /// Debit amount (zero for credit lines).
    fn debit(&self) -> Decimal;
    /// Credit amount (zero for debit lines).
    fn credit(&self) -> Decimal;
}

/// A journal line against a known account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// Account the line posts to.
    pub account_id: AccountId,
    /// Debit amount; zero when this is a credit line.
    pub debit: Decimal,
    /// Credit amount; zero when this is a debit line.
    pub credit: Decimal,
    /// Optional line memo.
    pub memo: Option<String>,
}

impl JournalLineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, memo: Option<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, memo: Option<String>) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo,
        }
    }
}

impl LineAmounts for JournalLineInput {
    fn debit(&self) -> Decimal {
        self.debit
    }

    fn credit(&self) -> Decimal {
        self.credit
    }
}

/// Debit and credit totals of a validated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of all debit lines.
    pub debit: Decimal,
    /// Sum of all credit lines.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_account_type_labels_roundtrip() {
        for account_type in AccountType::ALL {
            assert_eq!(
                AccountType::from_str(account_type.as_str()).unwrap(),
                account_type
            );
        }
    }

    #[rstest]
    #[case("expenses", AccountType::Expense)]
    #[case("Other Expenses", AccountType::OtherExpense)]
    #[case("accounts_receivable", AccountType::AccountsReceivable)]
    #[case("cost-of-goods-sold", AccountType::CostOfGoodsSold)]
    fn test_account_type_aliases(#[case] raw: &str, #[case] expected: AccountType) {
        assert_eq!(AccountType::from_str(raw).unwrap(), expected);
    }

    #[test]
    fn test_unknown_account_type() {
        assert!(matches!(
            AccountType::from_str("Crypto"),
            Err(LedgerError::UnknownAccountType(_))
        ));
    }

    #[rstest]
    #[case(AccountType::Bank, NormalBalance::Debit)]
    #[case(AccountType::OtherCurrentAssets, NormalBalance::Debit)]
    #[case(AccountType::CostOfGoodsSold, NormalBalance::Debit)]
    #[case(AccountType::OtherExpense, NormalBalance::Debit)]
    #[case(AccountType::AccountsPayable, NormalBalance::Credit)]
    #[case(AccountType::OtherCurrentLiabilities, NormalBalance::Credit)]
    #[case(AccountType::Equity, NormalBalance::Credit)]
    #[case(AccountType::OtherIncome, NormalBalance::Credit)]
    fn test_normal_balance(#[case] account_type: AccountType, #[case] expected: NormalBalance) {
        assert_eq!(account_type.normal_balance(), expected);
    }

    #[test]
    fn test_balance_change_by_side() {
        assert_eq!(
            NormalBalance::Debit.balance_change(dec!(100), dec!(30)),
            dec!(70)
        );
        assert_eq!(
            NormalBalance::Credit.balance_change(dec!(100), dec!(30)),
            dec!(-70)
        );
    }

    #[test]
    fn test_account_type_serde_uses_labels() {
        let json = serde_json::to_string(&AccountType::AccountsReceivable).unwrap();
        assert_eq!(json, "\"Accounts Receivable\"");
        let parsed: AccountType = serde_json::from_str("\"Expenses\"").unwrap();
        assert_eq!(parsed, AccountType::Expense);
    }

    #[test]
    fn test_entry_source_roundtrip() {
        for source in [
            EntrySource::Invoice,
            EntrySource::BillPayment,
            EntrySource::BankTransaction,
            EntrySource::Reversal,
        ] {
            assert_eq!(EntrySource::from_str(source.as_str()).unwrap(), source);
        }
    }
}
