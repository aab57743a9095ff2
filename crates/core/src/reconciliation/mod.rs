//! Bank reconciliation.
//!
//! This module implements the statement side of the books:
//! - CSV column detection and statement row normalization
//! - Bank transaction status transitions
//! - Categorization rules
//! - Matching statement lines to invoices, expenses, and bills
//! - Reconciliation sessions against a statement ending balance

pub mod columns;
pub mod error;
pub mod matching;
pub mod rules;
pub mod session;
pub mod statement;
pub mod status;

pub use columns::{ColumnDetection, ColumnMapping, ColumnRole, ResolvedColumns, detect_columns};
pub use error::ReconciliationError;
pub use matching::{
    BankLine, DocumentKind, MatchCriteria, MatchDecision, MatchDocument, check_amount, find_match,
};
pub use rules::{BankRule, RuleCondition, RuleEngine, RuleField, RuleOperator, RuleOutcome};
pub use session::{
    ClearableLine, SessionRef, SessionStatus, SessionSummary, ToggleEffect, check_complete,
    check_period, plan_toggle,
};
pub use statement::{
    DroppedRow, ParsedStatement, RawStatementRow, StatementRow, normalize_rows, parse_csv,
    parse_date, read_headers,
};
pub use status::{BankTransactionStatus, TransitionEffect};
