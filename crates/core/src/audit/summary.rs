//! Audit summaries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::types::{AuditAction, AuditRecord};

/// Counts over a filtered set of audit records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    /// Number of records.
    pub total: usize,
    /// Create actions.
    pub creates: usize,
    /// Update and status change actions.
    pub updates: usize,
    /// Delete actions.
    pub deletes: usize,
    /// Distinct entity types touched, sorted.
    pub entity_types: Vec<String>,
}

impl AuditSummary {
    /// Summarizes a set of records.
    #[must_use]
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        let mut entity_types = BTreeSet::new();

        for record in records {
            match &record.action {
                AuditAction::Create => summary.creates += 1,
                AuditAction::Delete => summary.deletes += 1,
                action if action.is_update() => summary.updates += 1,
                _ => {}
            }
            entity_types.insert(record.entity_type.as_str().to_string());
        }

        summary.entity_types = entity_types.into_iter().collect();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::EntityType;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(action: AuditAction, entity_type: EntityType) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            actor: "jane".into(),
            action,
            entity_type,
            entity_id: Uuid::new_v4(),
            detail: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record(AuditAction::Create, EntityType::Invoice),
            record(AuditAction::status_change("sent"), EntityType::Invoice),
            record(AuditAction::Update, EntityType::Account),
            record(AuditAction::Delete, EntityType::BankRule),
            record(AuditAction::Import, EntityType::Account),
        ];

        let summary = AuditSummary::from_records(&records);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.creates, 1);
        assert_eq!(summary.updates, 2);
        assert_eq!(summary.deletes, 1);
        assert_eq!(summary.entity_types, vec!["account", "bank_rule", "invoice"]);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(AuditSummary::from_records(&[]), AuditSummary::default());
    }
}
