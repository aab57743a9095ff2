//! `SeaORM` Entity for audit_log table.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::audit::{AuditError, AuditRecord};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub occurred_at: DateTimeWithTimeZone,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    /// JSON detail, stored as text so it can be searched with LIKE.
    #[sea_orm(column_type = "Text")]
    pub detail: String,
}

impl Model {
    /// The entry in domain form.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored action, entity type, or detail cannot
    /// be parsed.
    pub fn record(&self) -> Result<AuditRecord, AuditError> {
        Ok(AuditRecord {
            id: self.id,
            occurred_at: self.occurred_at.with_timezone(&Utc),
            actor: self.actor.clone(),
            action: self.action.parse()?,
            entity_type: self.entity_type.parse()?,
            entity_id: self.entity_id,
            detail: serde_json::from_str(&self.detail)?,
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
