//! Matching bank lines to invoices, expenses, and bills.
//!
//! A line matches a document when:
//! 1. the amount fits: deposits against an invoice's amount due,
//!    withdrawals against an expense or bill total;
//! 2. the line date is within the tolerance of one of the document's dates;
//! 3. among several candidates, the description score of the best one is
//!    at least the minimum and strictly beats the runner-up.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::config::ReconciliationConfig;
use uuid::Uuid;

use super::error::ReconciliationError;

/// Kind of document a bank line can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Open customer invoice.
    Invoice,
    /// Unmatched expense or cheque.
    Expense,
    /// Unpaid supplier bill.
    Bill,
}

impl DocumentKind {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Expense => "expense",
            Self::Bill => "bill",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invoice" => Some(Self::Invoice),
            "expense" => Some(Self::Expense),
            "bill" => Some(Self::Bill),
            _ => None,
        }
    }
}

/// Matching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCriteria {
    /// Maximum days between the line and a document date.
    pub date_tolerance_days: i64,
    /// Minimum description score (0-100) to pick among several candidates.
    pub min_description_score: u32,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self::from(&ReconciliationConfig::default())
    }
}

impl From<&ReconciliationConfig> for MatchCriteria {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            date_tolerance_days: config.date_tolerance_days,
            min_description_score: config.min_description_score,
        }
    }
}

/// The statement side of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankLine {
    /// Statement date.
    pub date: NaiveDate,
    /// Statement description.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
}

/// The book side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchDocument {
    /// Document kind.
    pub kind: DocumentKind,
    /// Document ID.
    pub id: Uuid,
    /// Invoice number, if any.
    pub number: Option<String>,
    /// Customer or payee.
    pub counterparty: String,
    /// Dates the line may be close to (issue and due date for invoices).
    pub dates: Vec<NaiveDate>,
    /// Positive amount expected on the statement.
    pub amount: Decimal,
}

/// Outcome of automatic matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    /// No document fits.
    NoCandidate,
    /// Exactly one document wins.
    Matched(MatchDocument),
    /// Several documents fit and none wins clearly.
    Ambiguous {
        /// Number of candidates.
        candidates: usize,
    },
}

/// Checks the amount criterion only.
///
/// # Errors
///
/// Returns `CriteriaNotMet` if the amount or direction does not fit.
pub fn check_amount(line: &BankLine, document: &MatchDocument) -> Result<(), ReconciliationError> {
    let fits = match document.kind {
        DocumentKind::Invoice => line.amount > Decimal::ZERO && line.amount == document.amount,
        DocumentKind::Expense | DocumentKind::Bill => {
            line.amount < Decimal::ZERO && -line.amount == document.amount
        }
    };
    if fits {
        Ok(())
    } else {
        Err(ReconciliationError::CriteriaNotMet(format!(
            "{} amount {} does not fit statement amount {}",
            document.kind.as_str(),
            document.amount,
            line.amount
        )))
    }
}

/// Smallest distance in days between the line and any document date.
#[must_use]
pub fn date_distance(line: &BankLine, document: &MatchDocument) -> Option<i64> {
    document
        .dates
        .iter()
        .map(|d| (line.date - *d).num_days().abs())
        .min()
}

/// Percentage of the document's tokens that appear in the description.
#[must_use]
pub fn description_score(description: &str, document: &MatchDocument) -> u32 {
    let line_tokens = tokens(description);
    let mut document_tokens = tokens(&document.counterparty);
    if let Some(number) = &document.number {
        document_tokens.extend(tokens(number));
    }
    if document_tokens.is_empty() {
        return 0;
    }
    let found = document_tokens.intersection(&line_tokens).count();
    u32::try_from(found * 100 / document_tokens.len()).unwrap_or(100)
}

fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
        .collect()
}

/// Returns true if the document satisfies the amount and date criteria.
#[must_use]
pub fn is_candidate(line: &BankLine, document: &MatchDocument, criteria: &MatchCriteria) -> bool {
    check_amount(line, document).is_ok()
        && date_distance(line, document).is_some_and(|d| d <= criteria.date_tolerance_days)
}

/// Picks the document a line should match, if the choice is clear.
#[must_use]
pub fn find_match(
    line: &BankLine,
    documents: &[MatchDocument],
    criteria: &MatchCriteria,
) -> MatchDecision {
    let mut scored: Vec<(u32, &MatchDocument)> = documents
        .iter()
        .filter(|d| is_candidate(line, d, criteria))
        .map(|d| (description_score(&line.description, d), d))
        .collect();

    match scored.len() {
        0 => MatchDecision::NoCandidate,
        1 => MatchDecision::Matched(scored[0].1.clone()),
        candidates => {
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            let (best, document) = scored[0];
            let runner_up = scored[1].0;
            if best >= criteria.min_description_score && best > runner_up {
                MatchDecision::Matched(document.clone())
            } else {
                MatchDecision::Ambiguous { candidates }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn invoice(
        number: &str,
        customer: &str,
        amount: Decimal,
        issued: NaiveDate,
        due: NaiveDate,
    ) -> MatchDocument {
        MatchDocument {
            kind: DocumentKind::Invoice,
            id: Uuid::new_v4(),
            number: Some(number.into()),
            counterparty: customer.into(),
            dates: vec![issued, due],
            amount,
        }
    }

    fn deposit(description: &str, amount: Decimal, date: NaiveDate) -> BankLine {
        BankLine {
            date,
            description: description.into(),
            amount,
        }
    }

    #[test]
    fn test_single_candidate_matches() {
        let doc = invoice("INV-0001", "Maple Design", dec!(452.00), ymd(3, 1), ymd(3, 31));
        let line = deposit("E-TRANSFER", dec!(452.00), ymd(4, 2));
        assert_eq!(
            find_match(&line, &[doc.clone()], &MatchCriteria::default()),
            MatchDecision::Matched(doc)
        );
    }

    #[test]
    fn test_due_date_counts_for_distance() {
        let doc = invoice("INV-0001", "Maple", dec!(10), ymd(1, 1), ymd(3, 1));
        let line = deposit("x", dec!(10), ymd(3, 10));
        assert_eq!(date_distance(&line, &doc), Some(9));
        assert!(is_candidate(&line, &doc, &MatchCriteria::default()));

        let late = deposit("x", dec!(10), ymd(3, 20));
        assert!(!is_candidate(&late, &doc, &MatchCriteria::default()));
    }

    #[test]
    fn test_direction_must_fit() {
        let doc = invoice("INV-0001", "Maple", dec!(10), ymd(3, 1), ymd(3, 1));
        let withdrawal = deposit("x", dec!(-10), ymd(3, 1));
        assert!(check_amount(&withdrawal, &doc).is_err());

        let bill = MatchDocument {
            kind: DocumentKind::Bill,
            id: Uuid::new_v4(),
            number: None,
            counterparty: "Hydro One".into(),
            dates: vec![ymd(3, 1)],
            amount: dec!(80.00),
        };
        assert!(check_amount(&withdrawal, &bill).is_err());
        assert!(check_amount(&deposit("HYDRO ONE", dec!(-80.00), ymd(3, 2)), &bill).is_ok());
    }

    #[test]
    fn test_description_breaks_tie() {
        let maple = invoice("INV-0001", "Maple Design", dec!(100), ymd(3, 1), ymd(3, 1));
        let birch = invoice("INV-0002", "Birch Labs", dec!(100), ymd(3, 1), ymd(3, 1));
        let line = deposit("DEPOSIT MAPLE DESIGN INC", dec!(100), ymd(3, 3));

        assert_eq!(description_score(&line.description, &maple), 50);
        assert_eq!(description_score(&line.description, &birch), 0);
        assert_eq!(
            find_match(&line, &[birch, maple.clone()], &MatchCriteria::default()),
            MatchDecision::Matched(maple)
        );
    }

    #[test]
    fn test_ambiguous_candidates_do_not_match() {
        let a = invoice("INV-0001", "Maple Design", dec!(100), ymd(3, 1), ymd(3, 1));
        let b = invoice("INV-0002", "Maple Design", dec!(100), ymd(3, 1), ymd(3, 1));
        let line = deposit("MAPLE DESIGN", dec!(100), ymd(3, 3));
        assert_eq!(
            find_match(&line, &[a, b], &MatchCriteria::default()),
            MatchDecision::Ambiguous { candidates: 2 }
        );
    }

    #[test]
    fn test_low_score_is_ambiguous() {
        let a = invoice("INV-0001", "Maple Design", dec!(100), ymd(3, 1), ymd(3, 1));
        let b = invoice("INV-0002", "Birch Labs", dec!(100), ymd(3, 1), ymd(3, 1));
        let line = deposit("MOBILE DEPOSIT MAPLE", dec!(100), ymd(3, 3));
        assert_eq!(description_score(&line.description, &a), 25);
        assert!(matches!(
            find_match(&line, &[a, b], &MatchCriteria::default()),
            MatchDecision::Ambiguous { .. }
        ));
    }

    #[test]
    fn test_no_candidate() {
        let doc = invoice("INV-0001", "Maple", dec!(100), ymd(3, 1), ymd(3, 1));
        let line = deposit("MAPLE", dec!(99.99), ymd(3, 1));
        assert_eq!(
            find_match(&line, &[doc], &MatchCriteria::default()),
            MatchDecision::NoCandidate
        );
    }
}
