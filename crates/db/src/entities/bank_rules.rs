//! `SeaORM` Entity for bank_rules table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::reconciliation::{BankRule, RuleCondition};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub priority: i32,
    /// JSON array of conditions.
    #[sea_orm(column_type = "Text")]
    pub conditions: String,
    pub assign_account_id: Option<Uuid>,
    pub assign_payee: Option<String>,
    pub auto_confirm: bool,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The rule in domain form.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored conditions are not valid JSON.
    pub fn rule(&self) -> Result<BankRule, serde_json::Error> {
        let conditions: Vec<RuleCondition> = serde_json::from_str(&self.conditions)?;
        Ok(BankRule {
            id: self.id.into(),
            name: self.name.clone(),
            priority: self.priority,
            conditions,
            assign_account: self.assign_account_id.map(Into::into),
            assign_payee: self.assign_payee.clone(),
            auto_confirm: self.auto_confirm,
            is_active: self.is_active,
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
