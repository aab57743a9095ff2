//! Audit trail domain logic.
//!
//! Every successful mutation produces exactly one audit record. This module
//! holds the record types, field-level diffs, summaries, and exports; the
//! persistence layer writes records inside the mutating transaction.

pub mod diff;
pub mod error;
pub mod export;
pub mod summary;
pub mod types;

pub use diff::{FieldChange, changes_detail, diff_fields};
pub use error::AuditError;
pub use export::{ExportFormat, export_records};
pub use summary::AuditSummary;
pub use types::{AuditAction, AuditFilter, AuditRecord, EntityType, NewAuditEntry};
