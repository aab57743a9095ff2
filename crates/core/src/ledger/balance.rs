//! Account balance calculations.
//!
//! An account's balance is always derived from the lines posted to it:
//! - Debit-normal accounts (assets, expenses): balance += debit - credit
//! - Credit-normal accounts (liabilities, equity, income): balance += credit - debit

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::types::AccountType;

/// Calculates the balance change of a line for an account of the given type.
#[must_use]
pub fn calculate_balance_change(
    account_type: AccountType,
    debit: Decimal,
    credit: Decimal,
) -> Decimal {
    account_type.normal_balance().balance_change(debit, credit)
}

/// Account header needed for aggregation and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account ID.
    pub id: AccountId,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
}

/// A posted journal line with the date of its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedLine {
    /// Account the line posted to.
    pub account_id: AccountId,
    /// Posting date of the owning entry.
    pub entry_date: NaiveDate,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Debit and credit totals of one account over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    /// Account ID.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

impl AccountTotals {
    /// Returns the balance signed by the account's normal side.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        calculate_balance_change(self.account_type, self.total_debit, self.total_credit)
    }
}

/// Inclusive date window; an open start means "since the first entry".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First date included, if bounded.
    pub start: Option<NaiveDate>,
    /// Last date included.
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window between two dates, both inclusive.
    #[must_use]
    pub const fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end,
        }
    }

    /// Window from the beginning of the books up to `end`.
    #[must_use]
    pub const fn up_to(end: NaiveDate) -> Self {
        Self { start: None, end }
    }

    /// Returns true if the date falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && date <= self.end
    }
}

/// Aggregates posted lines per account within a window.
///
/// Accounts without lines in the window are omitted; lines for unknown
/// accounts are ignored. Results follow chart-of-accounts order, then name.
#[must_use]
pub fn aggregate_totals(
    accounts: &[AccountInfo],
    lines: &[PostedLine],
    window: DateWindow,
) -> Vec<AccountTotals> {
    let by_id: HashMap<AccountId, &AccountInfo> = accounts.iter().map(|a| (a.id, a)).collect();
    let mut totals: HashMap<AccountId, AccountTotals> = HashMap::new();

    for line in lines.iter().filter(|l| window.contains(l.entry_date)) {
        let Some(account) = by_id.get(&line.account_id) else {
            continue;
        };
        let entry = totals.entry(line.account_id).or_insert_with(|| AccountTotals {
            account_id: account.id,
            name: account.name.clone(),
            account_type: account.account_type,
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
        });
        entry.total_debit += line.debit;
        entry.total_credit += line.credit;
    }

    let mut result: Vec<AccountTotals> = totals.into_values().collect();
    result.sort_by(|a, b| {
        type_rank(a.account_type)
            .cmp(&type_rank(b.account_type))
            .then_with(|| a.name.cmp(&b.name))
    });
    result
}

/// Position of the account type in chart-of-accounts order.
pub(crate) fn type_rank(account_type: AccountType) -> usize {
    AccountType::ALL
        .iter()
        .position(|t| *t == account_type)
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_balance_change_by_account_type() {
        assert_eq!(
            calculate_balance_change(AccountType::Bank, dec!(452.00), Decimal::ZERO),
            dec!(452.00)
        );
        assert_eq!(
            calculate_balance_change(AccountType::AccountsReceivable, Decimal::ZERO, dec!(452.00)),
            dec!(-452.00)
        );
        assert_eq!(
            calculate_balance_change(AccountType::Income, Decimal::ZERO, dec!(400.00)),
            dec!(400.00)
        );
    }

    #[test]
    fn test_window_contains() {
        let window = DateWindow::between(date(2026, 1, 1), date(2026, 1, 31));
        assert!(window.contains(date(2026, 1, 1)));
        assert!(window.contains(date(2026, 1, 31)));
        assert!(!window.contains(date(2026, 2, 1)));
        assert!(DateWindow::up_to(date(2026, 1, 31)).contains(date(2001, 5, 5)));
    }

    #[test]
    fn test_aggregate_totals_filters_window_and_orders() {
        let bank = AccountInfo {
            id: AccountId::new(),
            name: "Chequing".into(),
            account_type: AccountType::Bank,
        };
        let sales = AccountInfo {
            id: AccountId::new(),
            name: "Sales".into(),
            account_type: AccountType::Income,
        };
        let lines = vec![
            PostedLine {
                account_id: sales.id,
                entry_date: date(2026, 3, 2),
                debit: Decimal::ZERO,
                credit: dec!(100.00),
            },
            PostedLine {
                account_id: bank.id,
                entry_date: date(2026, 3, 2),
                debit: dec!(100.00),
                credit: Decimal::ZERO,
            },
            PostedLine {
                account_id: bank.id,
                entry_date: date(2026, 4, 1),
                debit: dec!(999.00),
                credit: Decimal::ZERO,
            },
        ];

        let totals = aggregate_totals(
            &[sales.clone(), bank.clone()],
            &lines,
            DateWindow::between(date(2026, 3, 1), date(2026, 3, 31)),
        );

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].account_id, bank.id);
        assert_eq!(totals[0].balance(), dec!(100.00));
        assert_eq!(totals[1].account_id, sales.id);
        assert_eq!(totals[1].balance(), dec!(100.00));
    }
}
