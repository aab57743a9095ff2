//! Bank transaction status machine.
//!
//! Valid transitions and their ledger effect:
//! - For Review → Categorized (post)
//! - Categorized → For Review (reverse)
//! - For Review ↔ Excluded (none)
//! - For Review, Excluded → Matched (match)
//! - Categorized → Matched (reverse, then match)
//!
//! Matched is final.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ReconciliationError;

/// Review status of an imported bank transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankTransactionStatus {
    /// Imported, awaiting a decision.
    ForReview,
    /// Assigned to a category account and posted.
    Categorized,
    /// Ignored; never posted.
    Excluded,
    /// Linked to an invoice, expense, or bill.
    Matched,
}

/// What a status change does to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Status only.
    None,
    /// Post the categorization entry.
    Post,
    /// Reverse the categorization entry.
    Reverse,
    /// Link to a document.
    Match,
    /// Reverse the categorization entry, then link to a document.
    ReverseThenMatch,
}

impl BankTransactionStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForReview => "for_review",
            Self::Categorized => "categorized",
            Self::Excluded => "excluded",
            Self::Matched => "matched",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "for_review" => Some(Self::ForReview),
            "categorized" => Some(Self::Categorized),
            "excluded" => Some(Self::Excluded),
            "matched" => Some(Self::Matched),
            _ => None,
        }
    }

    /// Validates a transition and returns its ledger effect.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for any pair not listed in the module docs.
    pub fn transition(self, to: Self) -> Result<TransitionEffect, ReconciliationError> {
        use BankTransactionStatus::{Categorized, Excluded, ForReview, Matched};

        match (self, to) {
            (ForReview, Categorized) => Ok(TransitionEffect::Post),
            (Categorized, ForReview) => Ok(TransitionEffect::Reverse),
            (ForReview, Excluded) | (Excluded, ForReview) => Ok(TransitionEffect::None),
            (ForReview | Excluded, Matched) => Ok(TransitionEffect::Match),
            (Categorized, Matched) => Ok(TransitionEffect::ReverseThenMatch),
            (from, to) => Err(ReconciliationError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for BankTransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BankTransactionStatus {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ReconciliationError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use BankTransactionStatus::{Categorized, Excluded, ForReview, Matched};

    #[rstest]
    #[case(ForReview, Categorized, TransitionEffect::Post)]
    #[case(Categorized, ForReview, TransitionEffect::Reverse)]
    #[case(ForReview, Excluded, TransitionEffect::None)]
    #[case(Excluded, ForReview, TransitionEffect::None)]
    #[case(ForReview, Matched, TransitionEffect::Match)]
    #[case(Excluded, Matched, TransitionEffect::Match)]
    #[case(Categorized, Matched, TransitionEffect::ReverseThenMatch)]
    fn test_allowed_transitions(
        #[case] from: BankTransactionStatus,
        #[case] to: BankTransactionStatus,
        #[case] effect: TransitionEffect,
    ) {
        assert_eq!(from.transition(to).unwrap(), effect);
    }

    #[rstest]
    #[case(ForReview, ForReview)]
    #[case(Categorized, Categorized)]
    #[case(Categorized, Excluded)]
    #[case(Excluded, Categorized)]
    #[case(Excluded, Excluded)]
    #[case(Matched, ForReview)]
    #[case(Matched, Categorized)]
    #[case(Matched, Excluded)]
    #[case(Matched, Matched)]
    fn test_rejected_transitions(
        #[case] from: BankTransactionStatus,
        #[case] to: BankTransactionStatus,
    ) {
        assert!(matches!(
            from.transition(to),
            Err(ReconciliationError::InvalidTransition { .. })
        ));
    }

    #[rstest]
    #[case("For Review", ForReview)]
    #[case("for_review", ForReview)]
    #[case("CATEGORIZED", Categorized)]
    fn test_parse(#[case] raw: &str, #[case] expected: BankTransactionStatus) {
        assert_eq!(raw.parse::<BankTransactionStatus>().unwrap(), expected);
    }
}
