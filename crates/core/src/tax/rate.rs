//! Tax rates and tax computation.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tally_shared::types::money::round_money;

use super::error::TaxError;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const THOUSAND: Decimal = Decimal::ONE_THOUSAND;

/// A sales tax rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    /// Lookup code, e.g. `HST-ON`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Rate in percent, up to three decimals.
    pub rate: Decimal,
    /// Collecting agency.
    pub agency: String,
    /// Inactive rates cannot be applied.
    pub is_active: bool,
}

impl TaxRate {
    /// Validates the rate and returns it if it may be applied.
    ///
    /// # Errors
    ///
    /// Returns `InactiveRate` for inactive rates.
    pub fn ensure_active(&self) -> Result<&Self, TaxError> {
        if self.is_active {
            Ok(self)
        } else {
            Err(TaxError::InactiveRate(self.code.clone()))
        }
    }

    /// Tax owed on a subtotal at this rate.
    #[must_use]
    pub fn tax_on(&self, subtotal: Decimal) -> Decimal {
        compute_tax(subtotal, self.rate)
    }
}

/// Canadian sales tax rates seeded for new organizations.
#[must_use]
pub fn default_rates() -> Vec<TaxRate> {
    [
        ("GST", "GST", Decimal::new(5, 0), "Canada Revenue Agency"),
        ("HST-ON", "HST (ON)", Decimal::new(13, 0), "Canada Revenue Agency"),
        ("QST", "QST", Decimal::new(9975, 3), "Revenu Québec"),
        ("PST-BC", "PST (BC)", Decimal::new(7, 0), "BC Ministry of Finance"),
    ]
    .into_iter()
    .map(|(code, name, rate, agency)| TaxRate {
        code: code.to_string(),
        name: name.to_string(),
        rate,
        agency: agency.to_string(),
        is_active: true,
    })
    .collect()
}

/// Tax on a subtotal: `subtotal * rate / 100`, rounded half away from zero
/// to cents.
#[must_use]
pub fn compute_tax(subtotal: Decimal, rate_percent: Decimal) -> Decimal {
    round_money(subtotal * rate_percent / ONE_HUNDRED)
}

/// Converts a percent rate to integer thousandths of a percent for storage.
///
/// # Errors
///
/// Returns `InvalidRate` if the rate is negative, above 100, or finer than
/// a thousandth of a percent.
pub fn rate_to_thousandths(rate: Decimal) -> Result<i64, TaxError> {
    if rate < Decimal::ZERO || rate > ONE_HUNDRED {
        return Err(TaxError::InvalidRate(rate));
    }
    let scaled = rate * THOUSAND;
    if !scaled.fract().is_zero() {
        return Err(TaxError::InvalidRate(rate));
    }
    scaled.to_i64().ok_or(TaxError::InvalidRate(rate))
}

/// Converts stored thousandths back to a percent rate.
#[must_use]
pub fn rate_from_thousandths(thousandths: i64) -> Decimal {
    Decimal::new(thousandths, 3).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(400.00), dec!(13), dec!(52.00))]
    #[case(dec!(100.00), dec!(9.975), dec!(9.98))]
    #[case(dec!(10.10), dec!(5), dec!(0.51))]
    #[case(dec!(0.10), dec!(5), dec!(0.01))]
    #[case(dec!(250.00), dec!(0), dec!(0.00))]
    fn test_compute_tax(
        #[case] subtotal: Decimal,
        #[case] rate: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(compute_tax(subtotal, rate), expected);
    }

    #[test]
    fn test_default_rates() {
        let rates = default_rates();
        assert_eq!(rates.len(), 4);
        let qst = rates.iter().find(|r| r.code == "QST").unwrap();
        assert_eq!(qst.rate, dec!(9.975));
        assert!(rates.iter().all(|r| r.is_active));
    }

    #[test]
    fn test_thousandths_storage() {
        assert_eq!(rate_to_thousandths(dec!(9.975)).unwrap(), 9975);
        assert_eq!(rate_to_thousandths(dec!(13)).unwrap(), 13000);
        assert_eq!(rate_from_thousandths(9975), dec!(9.975));
        assert_eq!(rate_from_thousandths(13000), dec!(13));
        assert!(rate_to_thousandths(dec!(9.9751)).is_err());
        assert!(rate_to_thousandths(dec!(-1)).is_err());
        assert!(rate_to_thousandths(dec!(101)).is_err());
    }

    #[test]
    fn test_inactive_rate_rejected() {
        let mut rate = default_rates().remove(0);
        rate.is_active = false;
        assert!(matches!(rate.ensure_active(), Err(TaxError::InactiveRate(_))));
    }
}
