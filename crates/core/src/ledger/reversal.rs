//! Reversing entries.
//!
//! Posted entries are never edited or deleted. Undoing one posts a mirror
//! entry with every debit and credit swapped, linked back to the original.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::JournalEntryId;

use super::error::LedgerError;
use super::types::{EntrySource, JournalLineInput};

/// The parts of a posted entry needed to reverse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Entry number, e.g. `JE-0003`.
    pub entry_number: String,
    /// Posting date.
    pub date: NaiveDate,
    /// Origin of the entry.
    pub source: EntrySource,
    /// Set when a reversal of this entry already exists.
    pub reversed_by: Option<JournalEntryId>,
    /// Posted lines.
    pub lines: Vec<JournalLineInput>,
}

/// Lines and metadata of a reversing entry, ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// Entry being reversed.
    pub original_id: JournalEntryId,
    /// Posting date of the reversal.
    pub date: NaiveDate,
    /// Memo of the reversal.
    pub memo: String,
    /// Mirrored lines.
    pub lines: Vec<JournalLineInput>,
}

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Builds the reversal of a posted entry.
    ///
    /// The reversal is dated `date` when given, otherwise on the original
    /// entry's date so period reports net to zero.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyReversed` if the entry has a reversal and
    /// `ReversalOfReversal` if the entry is itself a reversal.
    pub fn plan(
        entry: &PostedEntry,
        date: Option<NaiveDate>,
        reason: &str,
    ) -> Result<ReversalPlan, LedgerError> {
        if entry.source == EntrySource::Reversal {
            return Err(LedgerError::ReversalOfReversal(entry.id.into_inner()));
        }
        if entry.reversed_by.is_some() {
            return Err(LedgerError::AlreadyReversed(entry.id.into_inner()));
        }

        Ok(ReversalPlan {
            original_id: entry.id,
            date: date.unwrap_or(entry.date),
            memo: Self::reversal_memo(&entry.entry_number, reason),
            lines: Self::reversing_lines(&entry.lines),
        })
    }

    /// Swaps debit and credit on every line, keeping accounts and memos.
    #[must_use]
    pub fn reversing_lines(lines: &[JournalLineInput]) -> Vec<JournalLineInput> {
        lines
            .iter()
            .map(|line| JournalLineInput {
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                memo: line.memo.clone(),
            })
            .collect()
    }

    /// Memo recorded on a reversing entry.
    #[must_use]
    pub fn reversal_memo(entry_number: &str, reason: &str) -> String {
        let reason = reason.trim();
        if reason.is_empty() {
            format!("Reversal of {entry_number}")
        } else {
            format!("Reversal of {entry_number}: {reason}")
        }
    }

    /// Returns true if the lines net to zero, which every posted entry must.
    #[must_use]
    pub fn nets_to_zero(lines: &[JournalLineInput]) -> bool {
        let debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = lines.iter().map(|l| l.credit).sum();
        debit == credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn posted(source: EntrySource) -> PostedEntry {
        PostedEntry {
            id: JournalEntryId::new(),
            entry_number: "JE-0003".into(),
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            source,
            reversed_by: None,
            lines: vec![
                JournalLineInput::debit(AccountId::new(), dec!(452.00), Some("AR".into())),
                JournalLineInput::credit(AccountId::new(), dec!(400.00), None),
                JournalLineInput::credit(AccountId::new(), dec!(52.00), None),
            ],
        }
    }

    #[test]
    fn test_plan_swaps_sides() {
        let entry = posted(EntrySource::Invoice);
        let plan = ReversalService::plan(&entry, None, "Voided").unwrap();

        assert_eq!(plan.original_id, entry.id);
        assert_eq!(plan.date, entry.date);
        assert_eq!(plan.memo, "Reversal of JE-0003: Voided");
        assert_eq!(plan.lines[0].credit, dec!(452.00));
        assert_eq!(plan.lines[0].debit, Decimal::ZERO);
        assert_eq!(plan.lines[0].memo.as_deref(), Some("AR"));
        assert_eq!(plan.lines[2].debit, dec!(52.00));
        assert!(ReversalService::nets_to_zero(&plan.lines));
    }

    #[test]
    fn test_plan_uses_given_date() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let plan = ReversalService::plan(&posted(EntrySource::Expense), Some(date), "").unwrap();
        assert_eq!(plan.date, date);
        assert_eq!(plan.memo, "Reversal of JE-0003");
    }

    #[test]
    fn test_cannot_reverse_twice() {
        let mut entry = posted(EntrySource::Invoice);
        entry.reversed_by = Some(JournalEntryId::new());
        assert!(matches!(
            ReversalService::plan(&entry, None, "again"),
            Err(LedgerError::AlreadyReversed(_))
        ));
    }

    #[test]
    fn test_cannot_reverse_a_reversal() {
        assert!(matches!(
            ReversalService::plan(&posted(EntrySource::Reversal), None, "x"),
            Err(LedgerError::ReversalOfReversal(_))
        ));
    }
}
