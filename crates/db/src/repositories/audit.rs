//! Audit log repository.
//!
//! Entries are written inside the mutating transaction and never updated or
//! deleted.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use tally_core::audit::{
    AuditFilter, AuditRecord, AuditSummary, ExportFormat, NewAuditEntry, export_records,
};
use tally_shared::types::OrganizationId;
use uuid::Uuid;

use super::error::RepositoryError;
use crate::entities::audit_log;

/// Default page size for audit queries.
pub const DEFAULT_AUDIT_LIMIT: u64 = 100;

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an entry on the given connection, normally the open transaction
    /// of the mutation being audited.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record_in_txn<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        actor: &str,
        entry: NewAuditEntry,
    ) -> Result<audit_log::Model, RepositoryError> {
        let model = audit_log::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization_id.into_inner()),
            occurred_at: Set(Utc::now().into()),
            actor: Set(actor.to_string()),
            action: Set(entry.action.to_string()),
            entity_type: Set(entry.entity_type.as_str().to_string()),
            entity_id: Set(entry.entity_id),
            detail: Set(entry.detail.to_string()),
        };
        Ok(model.insert(conn).await?)
    }

    /// Queries entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored entry cannot be parsed.
    pub async fn query(
        &self,
        organization_id: OrganizationId,
        filter: &AuditFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<AuditRecord>, RepositoryError> {
        let rows = filtered(organization_id, filter)
            .order_by_desc(audit_log::Column::OccurredAt)
            .order_by_desc(audit_log::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        to_records(&rows)
    }

    /// Counts and groups every entry matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored entry cannot be parsed.
    pub async fn summary(
        &self,
        organization_id: OrganizationId,
        filter: &AuditFilter,
    ) -> Result<AuditSummary, RepositoryError> {
        let records = self.all(organization_id, filter).await?;
        Ok(AuditSummary::from_records(&records))
    }

    /// Exports every entry matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or the serialization fails.
    pub async fn export(
        &self,
        organization_id: OrganizationId,
        filter: &AuditFilter,
        format: ExportFormat,
    ) -> Result<String, RepositoryError> {
        let records = self.all(organization_id, filter).await?;
        Ok(export_records(&records, format)?)
    }

    async fn all(
        &self,
        organization_id: OrganizationId,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditRecord>, RepositoryError> {
        let rows = filtered(organization_id, filter)
            .order_by_desc(audit_log::Column::OccurredAt)
            .order_by_desc(audit_log::Column::Id)
            .all(&self.db)
            .await?;
        to_records(&rows)
    }
}

fn filtered(organization_id: OrganizationId, filter: &AuditFilter) -> Select<audit_log::Entity> {
    let mut query = audit_log::Entity::find()
        .filter(audit_log::Column::OrganizationId.eq(organization_id.into_inner()));

    if let Some(entity_type) = filter.entity_type {
        query = query.filter(audit_log::Column::EntityType.eq(entity_type.as_str()));
    }
    if let Some(entity_id) = filter.entity_id {
        query = query.filter(audit_log::Column::EntityId.eq(entity_id));
    }
    if let Some(action) = filter.action.as_deref().filter(|a| !a.is_empty()) {
        query = query.filter(audit_log::Column::Action.starts_with(action));
    }
    if let Some(actor) = &filter.actor {
        query = query.filter(audit_log::Column::Actor.eq(actor.as_str()));
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(audit_log::Column::Detail.contains(search));
    }
    if let Some(from) = filter.from {
        query = query.filter(audit_log::Column::OccurredAt.gte(from.fixed_offset()));
    }
    if let Some(to) = filter.to {
        query = query.filter(audit_log::Column::OccurredAt.lte(to.fixed_offset()));
    }
    query
}

fn to_records(rows: &[audit_log::Model]) -> Result<Vec<AuditRecord>, RepositoryError> {
    rows.iter()
        .map(|row| row.record().map_err(RepositoryError::from))
        .collect()
}
