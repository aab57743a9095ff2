//! Organization routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tally_db::{OrganizationRepository, entities::organizations};
use tally_shared::types::OrganizationId;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the organization routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations", post(create_organization))
        .route("/organizations/{org_id}", get(get_organization))
}

/// Request body for creating an organization.
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    /// Display name.
    pub name: String,
}

/// Response for an organization.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    /// Organization ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
}

impl From<organizations::Model> for OrganizationResponse {
    fn from(model: organizations::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

/// POST `/organizations` - Create an organization with its system accounts.
async fn create_organization(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<OrganizationResponse>)> {
    let repo = OrganizationRepository::new((*state.db).clone());
    let org = repo.create(actor.name(), &payload.name).await?;
    Ok((StatusCode::CREATED, Json(org.into())))
}

/// GET `/organizations/{org_id}`
async fn get_organization(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Json<OrganizationResponse>> {
    let repo = OrganizationRepository::new((*state.db).clone());
    Ok(Json(repo.get(org_id).await?.into()))
}
