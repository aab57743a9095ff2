//! Property-based tests for balance aggregation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::balance::{AccountInfo, DateWindow, PostedLine, aggregate_totals};
use super::types::{AccountCategory, AccountType};

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    (0usize..AccountType::ALL.len()).prop_map(|i| AccountType::ALL[i])
}

/// (debit account index, credit account index, cents, day offset)
fn posting_strategy(accounts: usize) -> impl Strategy<Value = (usize, usize, i64, i64)> {
    (0..accounts, 0..accounts, 1i64..10_000_000i64, 0i64..365)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced postings keep assets + expenses equal to liabilities +
    /// equity + income, whatever the window.
    #[test]
    fn prop_accounting_equation_holds(
        types in prop::collection::vec(account_type_strategy(), 2..8),
        postings in prop::collection::vec(posting_strategy(8), 1..30),
        window_end in 0i64..365,
    ) {
        let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let accounts: Vec<AccountInfo> = types
            .iter()
            .enumerate()
            .map(|(i, t)| AccountInfo {
                id: AccountId::new(),
                name: format!("Account {i}"),
                account_type: *t,
            })
            .collect();

        let mut lines = Vec::new();
        for (dr, cr, cents, day) in postings {
            let amount = Decimal::new(cents, 2);
            let entry_date = base + chrono::Duration::days(day);
            lines.push(PostedLine {
                account_id: accounts[dr % accounts.len()].id,
                entry_date,
                debit: amount,
                credit: Decimal::ZERO,
            });
            lines.push(PostedLine {
                account_id: accounts[cr % accounts.len()].id,
                entry_date,
                debit: Decimal::ZERO,
                credit: amount,
            });
        }

        let window = DateWindow::up_to(base + chrono::Duration::days(window_end));
        let totals = aggregate_totals(&accounts, &lines, window);

        let mut debit_side = Decimal::ZERO;
        let mut credit_side = Decimal::ZERO;
        for t in &totals {
            match t.account_type.category() {
                AccountCategory::Asset | AccountCategory::Expense => debit_side += t.balance(),
                AccountCategory::Liability | AccountCategory::Equity | AccountCategory::Income => {
                    credit_side += t.balance();
                }
            }
        }
        prop_assert_eq!(debit_side, credit_side);

        let total_debit: Decimal = totals.iter().map(|t| t.total_debit).sum();
        let total_credit: Decimal = totals.iter().map(|t| t.total_credit).sum();
        prop_assert_eq!(total_debit, total_credit);
    }
}
