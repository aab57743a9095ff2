//! Property-based tests for journal line validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::error::LedgerError;
use super::types::JournalLineInput;
use super::validation::validate_lines;

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a list of positive amounts.
fn amounts(max: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(positive_amount(), 1..max)
}

/// Builds one debit per amount, balanced by a single credit line.
fn balanced_lines(debits: &[Decimal]) -> Vec<JournalLineInput> {
    let total: Decimal = debits.iter().copied().sum();
    let mut lines: Vec<JournalLineInput> = debits
        .iter()
        .map(|amount| JournalLineInput::debit(AccountId::new(), *amount, None))
        .collect();
    lines.push(JournalLineInput::credit(AccountId::new(), total, None));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any set of debits offset by one credit of their sum validates.
    #[test]
    fn prop_balanced_lines_accepted(debits in amounts(8)) {
        let lines = balanced_lines(&debits);
        let totals = validate_lines(&lines);
        prop_assert!(totals.is_ok(), "expected balanced, got {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// Shifting one line by any non-zero cent amount unbalances the entry.
    #[test]
    fn prop_shifted_line_rejected(debits in amounts(8), shift in positive_amount()) {
        let mut lines = balanced_lines(&debits);
        lines[0].debit += shift;
        prop_assert!(
            matches!(validate_lines(&lines), Err(LedgerError::UnbalancedEntry { .. })),
            "shift of {} should unbalance",
            shift
        );
    }

    /// A negative amount on any line is rejected before the balance check.
    #[test]
    fn prop_negative_rejected(amount in positive_amount(), index in 0usize..2) {
        let mut lines = balanced_lines(&[amount]);
        if index == 0 {
            lines[0].debit = -amount;
        } else {
            lines[1].credit = -amount;
        }
        let rejected = matches!(
            validate_lines(&lines),
            Err(LedgerError::NegativeAmount { line }) if line == index
        );
        prop_assert!(rejected);
    }

    /// A line carrying both sides is rejected.
    #[test]
    fn prop_both_sides_rejected(amount in positive_amount()) {
        let mut lines = balanced_lines(&[amount, amount]);
        lines[1].credit = amount;
        lines[2].credit = amount;
        let rejected = matches!(
            validate_lines(&lines),
            Err(LedgerError::BothSides { line: 1 })
        );
        prop_assert!(rejected);
    }
}
