//! Organization repository.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry};
use tally_core::tax::default_rates;
use tally_shared::types::OrganizationId;
use uuid::Uuid;

use super::audit::AuditRepository;
use super::error::RepositoryError;
use super::tax::TaxRepository;
use crate::begin_serializable;
use crate::entities::organizations;

/// Organization repository.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an organization with the default tax rates.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name or a database error.
    pub async fn create(
        &self,
        actor: &str,
        name: &str,
    ) -> Result<organizations::Model, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::Validation(
                "organization name is required".to_string(),
            ));
        }

        let txn = begin_serializable(&self.db).await?;

        let organization = organizations::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;
        let organization_id = OrganizationId::from(organization.id);

        let rates = default_rates();
        for rate in &rates {
            TaxRepository::insert_rate_in_txn(&txn, organization_id, rate).await?;
        }

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Create,
                EntityType::Organization,
                organization.id,
                json!({ "name": organization.name, "taxRates": rates.len() }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(organization_id = %organization.id, "Organization created");
        Ok(organization)
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns `OrganizationNotFound` or a database error.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
    ) -> Result<organizations::Model, RepositoryError> {
        require(&self.db, organization_id).await
    }
}

/// Loads the organization or fails with `OrganizationNotFound`.
pub(crate) async fn require<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<organizations::Model, RepositoryError> {
    organizations::Entity::find_by_id(organization_id.into_inner())
        .one(conn)
        .await?
        .ok_or(RepositoryError::OrganizationNotFound(
            organization_id.into_inner(),
        ))
}
