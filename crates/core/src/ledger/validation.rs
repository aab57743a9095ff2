//! Business rule validation for journal entries.

use rust_decimal::Decimal;
use tally_shared::types::money::to_minor_units;

use super::error::LedgerError;
use super::types::{EntryTotals, LineAmounts};

/// Validates that a set of journal lines forms a postable entry.
///
/// Rules, checked in order:
/// 1. At least two lines
/// 2. No negative, sub-cent, or unstorably large amounts
/// 3. Exactly one side populated per line
/// 4. Total debits equal total credits
///
/// # Errors
///
/// Returns the first rule violation found.
pub fn validate_lines<L: LineAmounts>(lines: &[L]) -> Result<EntryTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    let mut debit = Decimal::ZERO;
    let mut credit = Decimal::ZERO;

    for (index, line) in lines.iter().enumerate() {
        let (line_debit, line_credit) = (line.debit(), line.credit());

        if line_debit < Decimal::ZERO || line_credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { line: index });
        }

        for amount in [line_debit, line_credit] {
            to_minor_units(amount)?;
        }

        match (line_debit.is_zero(), line_credit.is_zero()) {
            (false, false) => return Err(LedgerError::BothSides { line: index }),
            (true, true) => return Err(LedgerError::EmptyLine { line: index }),
            _ => {}
        }

        debit += line_debit;
        credit += line_credit;
    }

    let totals = EntryTotals { debit, credit };
    if !totals.is_balanced() {
        return Err(LedgerError::UnbalancedEntry { debit, credit });
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::JournalLineInput;
    use rust_decimal_macros::dec;
    use tally_shared::types::{AccountId, MoneyError};

    fn debit(amount: Decimal) -> JournalLineInput {
        JournalLineInput::debit(AccountId::new(), amount, None)
    }

    fn credit(amount: Decimal) -> JournalLineInput {
        JournalLineInput::credit(AccountId::new(), amount, None)
    }

    #[test]
    fn test_balanced_lines() {
        let totals = validate_lines(&[debit(dec!(100.00)), credit(dec!(100.00))]).unwrap();
        assert_eq!(totals.debit, dec!(100.00));
        assert!(totals.is_balanced());
    }

    #[test]
    fn test_split_lines_balance() {
        let lines = vec![
            debit(dec!(452.00)),
            credit(dec!(400.00)),
            credit(dec!(52.00)),
        ];
        assert!(validate_lines(&lines).is_ok());
    }

    #[test]
    fn test_unbalanced_lines() {
        let result = validate_lines(&[debit(dec!(100.00)), credit(dec!(50.00))]);
        assert!(matches!(
            result,
            Err(LedgerError::UnbalancedEntry { debit, credit })
                if debit == dec!(100.00) && credit == dec!(50.00)
        ));
    }

    #[test]
    fn test_no_lines() {
        let lines: Vec<JournalLineInput> = vec![];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::InsufficientLines)
        ));
    }

    #[test]
    fn test_single_line() {
        assert!(matches!(
            validate_lines(&[debit(dec!(1))]),
            Err(LedgerError::InsufficientLines)
        ));
    }

    #[test]
    fn test_both_sides_rejected() {
        let mut line = debit(dec!(10));
        line.credit = dec!(10);
        assert!(matches!(
            validate_lines(&[line, credit(dec!(0))]),
            Err(LedgerError::BothSides { line: 0 })
        ));
    }

    #[test]
    fn test_empty_line_rejected() {
        assert!(matches!(
            validate_lines(&[debit(dec!(10)), credit(dec!(10)), credit(dec!(0))]),
            Err(LedgerError::EmptyLine { line: 2 })
        ));
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            validate_lines(&[debit(dec!(-10)), credit(dec!(-10))]),
            Err(LedgerError::NegativeAmount { line: 0 })
        ));
    }

    #[test]
    fn test_sub_cent_rejected() {
        assert!(matches!(
            validate_lines(&[debit(dec!(10.001)), credit(dec!(10.001))]),
            Err(LedgerError::Money(MoneyError::TooPrecise(_)))
        ));
    }

    #[test]
    fn test_amount_beyond_storage_rejected_without_overflow() {
        assert!(matches!(
            validate_lines(&[
                debit(Decimal::MAX),
                debit(Decimal::MAX),
                credit(dec!(1.00)),
            ]),
            Err(LedgerError::Money(MoneyError::OutOfRange(_)))
        ));
    }
}
