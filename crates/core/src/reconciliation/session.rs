//! Statement reconciliation sessions.
//!
//! A session ties a bank account to one statement: its period and its ending
//! balance. Transactions are ticked off against the statement until the
//! cleared balance agrees with it; only then can the session be completed.
//! Completed sessions are locked.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ReconciliationId};

use super::error::ReconciliationError;
use super::status::BankTransactionStatus;

/// Progress of a reconciliation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Transactions can still be ticked off.
    InProgress,
    /// Statement agreed; the session is locked.
    Completed,
}

impl SessionStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ReconciliationError::UnknownStatus(s.to_string())),
        }
    }
}

/// The session fields the toggle and completion checks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRef {
    /// Session ID.
    pub id: ReconciliationId,
    /// Bank or credit card account being reconciled.
    pub account_id: AccountId,
    /// Statement period start.
    pub start_date: NaiveDate,
    /// Statement period end.
    pub end_date: NaiveDate,
    /// Current progress.
    pub status: SessionStatus,
}

/// The transaction fields the toggle check needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearableLine {
    /// Account the line was imported into.
    pub account_id: AccountId,
    /// Statement date.
    pub date: NaiveDate,
    /// Review status.
    pub status: BankTransactionStatus,
    /// Session the line is currently reconciled in.
    pub reconciled_in: Option<ReconciliationId>,
}

/// What ticking a line does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEffect {
    /// Mark the line reconciled in this session.
    Reconcile,
    /// Clear the mark this session set.
    Unreconcile,
}

/// Cleared balance against the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Statement ending balance.
    pub statement_balance: Decimal,
    /// Sum of every reconciled line dated up to the statement end.
    pub cleared_balance: Decimal,
    /// Statement balance less cleared balance.
    pub difference: Decimal,
    /// Lines ticked off in this session.
    pub reconciled_count: usize,
    /// The difference is zero.
    pub is_balanced: bool,
}

impl SessionSummary {
    /// Compares the statement balance with the cleared lines.
    #[must_use]
    pub fn compute(
        statement_balance: Decimal,
        cleared_amounts: impl IntoIterator<Item = Decimal>,
        reconciled_count: usize,
    ) -> Self {
        let cleared_balance: Decimal = cleared_amounts.into_iter().sum();
        let difference = statement_balance - cleared_balance;
        Self {
            statement_balance,
            cleared_balance,
            difference,
            reconciled_count,
            is_balanced: difference.is_zero(),
        }
    }
}

/// Validates a statement period.
///
/// # Errors
///
/// Returns `InvalidPeriod` if `start` is after `end`.
pub fn check_period(start: NaiveDate, end: NaiveDate) -> Result<(), ReconciliationError> {
    if start > end {
        return Err(ReconciliationError::InvalidPeriod { start, end });
    }
    Ok(())
}

/// Decides whether ticking `line` reconciles or unreconciles it.
///
/// # Errors
///
/// Returns `SessionCompleted`, `WrongAccount`, `OutsideStatementPeriod`,
/// `ExcludedTransaction`, or `ReconciledElsewhere`.
pub fn plan_toggle(
    session: &SessionRef,
    line: &ClearableLine,
) -> Result<ToggleEffect, ReconciliationError> {
    if session.status == SessionStatus::Completed {
        return Err(ReconciliationError::SessionCompleted);
    }
    if line.account_id != session.account_id {
        return Err(ReconciliationError::WrongAccount);
    }
    match line.reconciled_in {
        Some(id) if id == session.id => return Ok(ToggleEffect::Unreconcile),
        Some(_) => return Err(ReconciliationError::ReconciledElsewhere),
        None => {}
    }
    if line.date > session.end_date {
        return Err(ReconciliationError::OutsideStatementPeriod(line.date));
    }
    if line.status == BankTransactionStatus::Excluded {
        return Err(ReconciliationError::ExcludedTransaction);
    }
    Ok(ToggleEffect::Reconcile)
}

/// Checks that a session may be completed.
///
/// # Errors
///
/// Returns `SessionCompleted` or `OutOfBalance`.
pub fn check_complete(
    session: &SessionRef,
    summary: &SessionSummary,
) -> Result<(), ReconciliationError> {
    if session.status == SessionStatus::Completed {
        return Err(ReconciliationError::SessionCompleted);
    }
    if !summary.is_balanced {
        return Err(ReconciliationError::OutOfBalance {
            difference: summary.difference,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session() -> SessionRef {
        SessionRef {
            id: ReconciliationId::new(),
            account_id: AccountId::new(),
            start_date: date(2026, 2, 1),
            end_date: date(2026, 2, 28),
            status: SessionStatus::InProgress,
        }
    }

    fn line(session: &SessionRef, on: NaiveDate) -> ClearableLine {
        ClearableLine {
            account_id: session.account_id,
            date: on,
            status: BankTransactionStatus::Categorized,
            reconciled_in: None,
        }
    }

    #[test]
    fn test_toggle_reconciles_then_unreconciles() {
        let session = session();
        let mut line = line(&session, date(2026, 2, 9));
        assert_eq!(plan_toggle(&session, &line).unwrap(), ToggleEffect::Reconcile);

        line.reconciled_in = Some(session.id);
        assert_eq!(plan_toggle(&session, &line).unwrap(), ToggleEffect::Unreconcile);
    }

    #[test]
    fn test_uncleared_items_from_earlier_periods_can_be_reconciled() {
        let session = session();
        let line = line(&session, date(2026, 1, 15));
        assert_eq!(plan_toggle(&session, &line).unwrap(), ToggleEffect::Reconcile);
    }

    #[test]
    fn test_toggle_rejections() {
        let session = session();

        let after = line(&session, date(2026, 3, 1));
        assert!(matches!(
            plan_toggle(&session, &after),
            Err(ReconciliationError::OutsideStatementPeriod(_))
        ));

        let mut other_account = line(&session, date(2026, 2, 9));
        other_account.account_id = AccountId::new();
        assert!(matches!(
            plan_toggle(&session, &other_account),
            Err(ReconciliationError::WrongAccount)
        ));

        let mut excluded = line(&session, date(2026, 2, 9));
        excluded.status = BankTransactionStatus::Excluded;
        assert!(matches!(
            plan_toggle(&session, &excluded),
            Err(ReconciliationError::ExcludedTransaction)
        ));

        let mut elsewhere = line(&session, date(2026, 2, 9));
        elsewhere.reconciled_in = Some(ReconciliationId::new());
        assert!(matches!(
            plan_toggle(&session, &elsewhere),
            Err(ReconciliationError::ReconciledElsewhere)
        ));
    }

    #[test]
    fn test_completed_session_is_locked() {
        let mut session = session();
        session.status = SessionStatus::Completed;
        let line = line(&session, date(2026, 2, 9));

        assert!(matches!(
            plan_toggle(&session, &line),
            Err(ReconciliationError::SessionCompleted)
        ));
        let summary = SessionSummary::compute(Decimal::ZERO, std::iter::empty(), 0);
        assert!(matches!(
            check_complete(&session, &summary),
            Err(ReconciliationError::SessionCompleted)
        ));
    }

    #[test]
    fn test_summary_difference_and_completion() {
        let session = session();

        let short = SessionSummary::compute(dec!(437.25), [dec!(452.00)], 1);
        assert_eq!(short.difference, dec!(-14.75));
        assert!(!short.is_balanced);
        assert!(matches!(
            check_complete(&session, &short),
            Err(ReconciliationError::OutOfBalance { difference }) if difference == dec!(-14.75)
        ));

        let agreed = SessionSummary::compute(dec!(437.25), [dec!(452.00), dec!(-14.75)], 2);
        assert!(agreed.is_balanced);
        assert_eq!(agreed.reconciled_count, 2);
        assert!(check_complete(&session, &agreed).is_ok());
    }

    #[test]
    fn test_period_must_not_be_inverted() {
        assert!(check_period(date(2026, 2, 1), date(2026, 2, 28)).is_ok());
        assert!(matches!(
            check_period(date(2026, 3, 1), date(2026, 2, 28)),
            Err(ReconciliationError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        assert_eq!("in_progress".parse::<SessionStatus>().unwrap(), SessionStatus::InProgress);
        assert_eq!("Completed".parse::<SessionStatus>().unwrap(), SessionStatus::Completed);
        assert!("open".parse::<SessionStatus>().is_err());
    }
}
