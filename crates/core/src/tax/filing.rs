//! Sales tax summaries and filings.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::balance::AccountTotals;
use crate::posting::types::SystemAccount;

use super::error::TaxError;

/// Sales tax position over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxSummary {
    /// Net credits to GST/HST Payable.
    pub collected: Decimal,
    /// Net debits to GST/HST Receivable.
    pub paid: Decimal,
    /// `collected - paid`; positive means tax owing.
    pub net: Decimal,
}

impl TaxSummary {
    /// Computes the summary from per-account totals over the period.
    #[must_use]
    pub fn from_totals(totals: &[AccountTotals]) -> Self {
        let named = |account: SystemAccount| {
            totals
                .iter()
                .filter(|t| t.name == account.name())
                .map(AccountTotals::balance)
                .sum::<Decimal>()
        };
        let collected = named(SystemAccount::SalesTaxPayable);
        let paid = named(SystemAccount::SalesTaxReceivable);
        Self {
            collected,
            paid,
            net: collected - paid,
        }
    }
}

/// Lifecycle of a tax filing. Moves forward one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxFilingStatus {
    /// Period not yet due.
    Upcoming,
    /// Return is due.
    Due,
    /// Return filed with the agency.
    Filed,
    /// Balance remitted.
    Paid,
}

impl TaxFilingStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Due => "due",
            Self::Filed => "filed",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "upcoming" => Some(Self::Upcoming),
            "due" => Some(Self::Due),
            "filed" => Some(Self::Filed),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// The only status this one may move to.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Upcoming => Some(Self::Due),
            Self::Due => Some(Self::Filed),
            Self::Filed => Some(Self::Paid),
            Self::Paid => None,
        }
    }

    /// Validates a transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless `to` is the next status.
    pub fn transition(self, to: Self) -> Result<Self, TaxError> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(TaxError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for TaxFilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prepared tax return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxFiling {
    /// Collecting agency.
    pub agency: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Tax collected on sales.
    pub collected: Decimal,
    /// Tax paid on purchases.
    pub paid: Decimal,
    /// Manual adjustment added to the net.
    pub adjustment: Decimal,
    /// `collected - paid + adjustment`.
    pub net_tax: Decimal,
    /// Filing status.
    pub status: TaxFilingStatus,
}

impl TaxFiling {
    /// Prepares an upcoming filing from the period's tax summary.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if the period ends before it starts.
    pub fn prepare(
        agency: impl Into<String>,
        period_start: NaiveDate,
        period_end: NaiveDate,
        summary: TaxSummary,
        adjustment: Decimal,
    ) -> Result<Self, TaxError> {
        if period_end < period_start {
            return Err(TaxError::InvalidPeriod);
        }
        Ok(Self {
            agency: agency.into(),
            period_start,
            period_end,
            collected: summary.collected,
            paid: summary.paid,
            adjustment,
            net_tax: summary.net + adjustment,
            status: TaxFilingStatus::Upcoming,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::AccountType;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn totals(
        name: &str,
        account_type: AccountType,
        debit: Decimal,
        credit: Decimal,
    ) -> AccountTotals {
        AccountTotals {
            account_id: AccountId::new(),
            name: name.into(),
            account_type,
            total_debit: debit,
            total_credit: credit,
        }
    }

    #[test]
    fn test_summary_from_totals() {
        let summary = TaxSummary::from_totals(&[
            totals("GST/HST Payable", AccountType::OtherCurrentLiabilities, dec!(0), dec!(52.00)),
            totals("GST/HST Receivable", AccountType::OtherCurrentAssets, dec!(13.00), dec!(0)),
            totals("Sales", AccountType::Income, dec!(0), dec!(400.00)),
        ]);
        assert_eq!(summary.collected, dec!(52.00));
        assert_eq!(summary.paid, dec!(13.00));
        assert_eq!(summary.net, dec!(39.00));
    }

    #[test]
    fn test_status_moves_forward_only() {
        assert_eq!(
            TaxFilingStatus::Upcoming.transition(TaxFilingStatus::Due).unwrap(),
            TaxFilingStatus::Due
        );
        assert!(TaxFilingStatus::Due.transition(TaxFilingStatus::Upcoming).is_err());
        assert!(TaxFilingStatus::Upcoming.transition(TaxFilingStatus::Paid).is_err());
        assert!(TaxFilingStatus::Paid.transition(TaxFilingStatus::Paid).is_err());
    }

    #[test]
    fn test_prepare_filing() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let summary = TaxSummary {
            collected: dec!(52.00),
            paid: dec!(13.00),
            net: dec!(39.00),
        };
        let filing =
            TaxFiling::prepare("Canada Revenue Agency", start, end, summary, dec!(-1.00)).unwrap();
        assert_eq!(filing.net_tax, dec!(38.00));
        assert_eq!(filing.status, TaxFilingStatus::Upcoming);
        assert!(matches!(
            TaxFiling::prepare("CRA", end, start, summary, dec!(0)),
            Err(TaxError::InvalidPeriod)
        ));
    }
}
