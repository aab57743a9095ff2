//! Audit record types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::error::AuditError;

const STATUS_CHANGE_PREFIX: &str = "status_change_";

/// What a mutation did.
///
/// Stored as snake_case text; status changes carry the new status, e.g.
/// `status_change_deposited`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Entity fields changed.
    Update,
    /// Entity deleted.
    Delete,
    /// Entity moved to a new status.
    StatusChange(String),
    /// Payment applied.
    Payment,
    /// Bank statement rows imported.
    Import,
    /// Journal entry reversed.
    Reverse,
    /// Bank transaction matched to a document.
    Match,
    /// Bank rule applied to a transaction.
    ApplyRule,
    /// Bank transaction ticked or unticked in a reconciliation.
    Reconcile,
}

impl AuditAction {
    /// Builds a status change action from a status label.
    #[must_use]
    pub fn status_change(status: &str) -> Self {
        Self::StatusChange(status.to_string())
    }

    /// Returns true for actions counted as updates in summaries.
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update | Self::StatusChange(_))
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
            Self::StatusChange(status) => write!(f, "{STATUS_CHANGE_PREFIX}{status}"),
            Self::Payment => f.write_str("payment"),
            Self::Import => f.write_str("import"),
            Self::Reverse => f.write_str("reverse"),
            Self::Match => f.write_str("match"),
            Self::ApplyRule => f.write_str("apply_rule"),
            Self::Reconcile => f.write_str("reconcile"),
        }
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "payment" => Ok(Self::Payment),
            "import" => Ok(Self::Import),
            "reverse" => Ok(Self::Reverse),
            "match" => Ok(Self::Match),
            "apply_rule" => Ok(Self::ApplyRule),
            "reconcile" => Ok(Self::Reconcile),
            other => other
                .strip_prefix(STATUS_CHANGE_PREFIX)
                .filter(|status| !status.is_empty())
                .map(Self::status_change)
                .ok_or_else(|| AuditError::UnknownAction(other.to_string())),
        }
    }
}

impl Serialize for AuditAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuditAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of entity an audit record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Organization.
    Organization,
    /// Chart of accounts entry.
    Account,
    /// Journal entry.
    JournalEntry,
    /// Customer invoice.
    Invoice,
    /// Expense, cheque, or bill.
    Expense,
    /// Imported bank statement line.
    BankTransaction,
    /// Bank categorization rule.
    BankRule,
    /// Sales tax rate.
    TaxRate,
    /// Sales tax filing.
    TaxFiling,
    /// Statement reconciliation session.
    Reconciliation,
}

impl EntityType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Account => "account",
            Self::JournalEntry => "journal_entry",
            Self::Invoice => "invoice",
            Self::Expense => "expense",
            Self::BankTransaction => "bank_transaction",
            Self::BankRule => "bank_rule",
            Self::TaxRate => "tax_rate",
            Self::TaxFiling => "tax_filing",
            Self::Reconciliation => "reconciliation",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" => Ok(Self::Organization),
            "account" => Ok(Self::Account),
            "journal_entry" => Ok(Self::JournalEntry),
            "invoice" => Ok(Self::Invoice),
            "expense" => Ok(Self::Expense),
            "bank_transaction" => Ok(Self::BankTransaction),
            "bank_rule" => Ok(Self::BankRule),
            "tax_rate" => Ok(Self::TaxRate),
            "tax_filing" => Ok(Self::TaxFiling),
            "reconciliation" => Ok(Self::Reconciliation),
            other => Err(AuditError::UnknownEntityType(other.to_string())),
        }
    }
}

/// An audit record about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// Kind of entity affected.
    pub entity_type: EntityType,
    /// ID of the entity affected.
    pub entity_id: Uuid,
    /// Structured detail.
    pub detail: serde_json::Value,
}

impl NewAuditEntry {
    /// Creates an entry with the given detail.
    #[must_use]
    pub fn new(
        action: AuditAction,
        entity_type: EntityType,
        entity_id: impl Into<Uuid>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            action,
            entity_type,
            entity_id: entity_id.into(),
            detail,
        }
    }
}

/// A stored audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Record ID.
    pub id: Uuid,
    /// When the mutation committed.
    pub occurred_at: DateTime<Utc>,
    /// Who performed it.
    pub actor: String,
    /// What happened.
    pub action: AuditAction,
    /// Kind of entity affected.
    pub entity_type: EntityType,
    /// ID of the entity affected.
    pub entity_id: Uuid,
    /// Structured detail.
    pub detail: serde_json::Value,
}

/// Filters for audit queries.
///
/// `action` is a prefix match, so `status_change` selects every status change.
/// `search` is a case-sensitive substring match over the serialized detail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    /// Entity type.
    pub entity_type: Option<EntityType>,
    /// Entity ID.
    pub entity_id: Option<Uuid>,
    /// Action prefix.
    pub action: Option<String>,
    /// Actor.
    pub actor: Option<String>,
    /// Free text over the detail.
    pub search: Option<String>,
    /// Earliest timestamp, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Latest timestamp, inclusive.
    pub to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("create", AuditAction::Create)]
    #[case("apply_rule", AuditAction::ApplyRule)]
    #[case("reconcile", AuditAction::Reconcile)]
    #[case("status_change_deposited", AuditAction::status_change("deposited"))]
    #[case("status_change_for_review", AuditAction::status_change("for_review"))]
    fn test_action_parse_and_display(#[case] raw: &str, #[case] expected: AuditAction) {
        let parsed: AuditAction = raw.parse().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.to_string(), raw);
    }

    #[test]
    fn test_unknown_action() {
        assert!(matches!(
            "status_change_".parse::<AuditAction>(),
            Err(AuditError::UnknownAction(_))
        ));
        assert!("rename".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_action_serializes_as_string() {
        let json = serde_json::to_value(AuditAction::status_change("paid")).unwrap();
        assert_eq!(json, "status_change_paid");
        let back: AuditAction = serde_json::from_value(json).unwrap();
        assert!(back.is_update());
    }

    #[test]
    fn test_entity_type_roundtrip() {
        for entity in [
            EntityType::Account,
            EntityType::JournalEntry,
            EntityType::BankTransaction,
            EntityType::TaxFiling,
            EntityType::Reconciliation,
        ] {
            assert_eq!(entity.as_str().parse::<EntityType>().unwrap(), entity);
        }
    }
}
