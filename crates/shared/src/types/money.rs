//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` in the domain and are persisted as
//! integer minor units (cents) so every supported database stores them exactly.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of fractional digits carried by every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Errors raised while converting or parsing monetary amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The text could not be parsed as an amount.
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),

    /// The amount has more fractional digits than the money scale allows.
    #[error("Amount {0} has more than two fractional digits")]
    TooPrecise(Decimal),

    /// The amount does not fit into minor-unit storage.
    #[error("Amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Rounds an amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Converts an amount to minor units (cents).
///
/// # Errors
///
/// Returns `TooPrecise` if the amount carries sub-cent digits and
/// `OutOfRange` if it does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(MoneyError::OutOfRange(amount))?;
    if !scaled.fract().is_zero() {
        return Err(MoneyError::TooPrecise(amount));
    }
    scaled.to_i64().ok_or(MoneyError::OutOfRange(amount))
}

/// Checks that an amount, rounded to cents, fits minor-unit storage.
///
/// Amounts taken from callers pass through here before any arithmetic so
/// sums and tax products stay far from `Decimal`'s limits.
///
/// # Errors
///
/// Returns `OutOfRange` if the amount does not fit in an `i64` of cents.
pub fn check_range(amount: Decimal) -> Result<Decimal, MoneyError> {
    to_minor_units(round_money(amount)).map(|_| amount)
}

/// Converts minor units (cents) back to a two-digit decimal amount.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

/// Parses an externally formatted amount such as `$1,234.50`, `-12`, or `(45.00)`.
///
/// Currency symbols, thousands separators and whitespace are stripped; a value
/// wrapped in parentheses is negative. The result is rounded to cents.
///
/// # Errors
///
/// Returns `InvalidAmount` if nothing numeric remains after cleaning.
pub fn parse_amount(raw: &str) -> Result<Decimal, MoneyError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    let negative_parens = cleaned.len() >= 2 && cleaned.starts_with('(') && cleaned.ends_with(')');
    let digits = if negative_parens {
        &cleaned[1..cleaned.len() - 1]
    } else {
        cleaned.as_str()
    };

    if digits.is_empty() {
        return Err(MoneyError::InvalidAmount(raw.to_string()));
    }

    let value =
        Decimal::from_str(digits).map_err(|_| MoneyError::InvalidAmount(raw.to_string()))?;
    let value = if negative_parens { -value.abs() } else { value };
    Ok(round_money(value))
}

/// Formats an amount for display with thousands separators and
/// parenthesized negatives, e.g. `(1,234.50)`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let text = rounded.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("({grouped}.{fraction})")
    } else {
        format!("{grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minor_units_roundtrip_keeps_two_digits() {
        let minor = to_minor_units(dec!(452.00)).unwrap();
        assert_eq!(minor, 45200);
        assert_eq!(from_minor_units(minor).to_string(), "452.00");
    }

    #[test]
    fn test_minor_units_rejects_sub_cent_amounts() {
        assert_eq!(
            to_minor_units(dec!(1.005)),
            Err(MoneyError::TooPrecise(dec!(1.005)))
        );
    }

    #[test]
    fn test_minor_units_negative() {
        assert_eq!(to_minor_units(dec!(-12.34)).unwrap(), -1234);
    }

    #[rstest]
    #[case(Decimal::MAX)]
    #[case(Decimal::MIN)]
    #[case(dec!(100000000000000000000))]
    #[case(dec!(-92233720368547758.09))]
    fn test_minor_units_out_of_range(#[case] amount: Decimal) {
        assert_eq!(to_minor_units(amount), Err(MoneyError::OutOfRange(amount)));
    }

    #[test]
    fn test_check_range() {
        assert_eq!(check_range(dec!(0.125)), Ok(dec!(0.125)));
        assert_eq!(
            check_range(Decimal::MAX),
            Err(MoneyError::OutOfRange(Decimal::MAX))
        );
    }

    #[test]
    fn test_largest_parsable_amount_is_out_of_range_not_a_panic() {
        let amount = parse_amount("79228162514264337593543950335").unwrap();
        assert!(matches!(
            to_minor_units(amount),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[rstest]
    #[case("$1,234.50", dec!(1234.50))]
    #[case("  -12 ", dec!(-12.00))]
    #[case("(45.00)", dec!(-45.00))]
    #[case("$(1,000)", dec!(-1000.00))]
    #[case("0.125", dec!(0.13))]
    #[case("-0.125", dec!(-0.13))]
    fn test_parse_amount(#[case] raw: &str, #[case] expected: Decimal) {
        assert_eq!(parse_amount(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("$")]
    #[case("abc")]
    #[case("12.3.4")]
    fn test_parse_amount_invalid(#[case] raw: &str) {
        assert!(matches!(parse_amount(raw), Err(MoneyError::InvalidAmount(_))));
    }

    #[rstest]
    #[case(dec!(0), "0.00")]
    #[case(dec!(452), "452.00")]
    #[case(dec!(1234.5), "1,234.50")]
    #[case(dec!(-1234567.891), "(1,234,567.89)")]
    #[case(dec!(-0.001), "0.00")]
    fn test_format_amount(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(format_amount(amount), expected);
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(22.6)).to_string(), "22.60");
        assert_eq!(round_money(dec!(0.005)), dec!(0.01));
        assert_eq!(round_money(dec!(-0.005)), dec!(-0.01));
    }
}
