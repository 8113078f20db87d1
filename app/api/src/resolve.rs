//! Loads an org (and optionally app) from the store and overlays them
//! into the `EffectiveConfig` the metering/selection crates operate on.

use crate::error::ApiError;
use crate::state::AppState;
use model_meter_domain::{ApiError as DomainError, EffectiveConfig};
use uuid::Uuid;

pub async fn effective_config_for_org(state: &AppState, org_id: Uuid) -> Result<EffectiveConfig, ApiError> {
    let org = state
        .store
        .get_organization(org_id)
        .await?
        .ok_or_else(|| DomainError::not_found("no such organization"))?;
    Ok(EffectiveConfig::for_org(&org))
}

pub async fn effective_config_for_app(state: &AppState, org_id: Uuid, app_id: &str) -> Result<EffectiveConfig, ApiError> {
    let org = state
        .store
        .get_organization(org_id)
        .await?
        .ok_or_else(|| DomainError::not_found("no such organization"))?;
    let app = state
        .store
        .get_application(org_id, app_id)
        .await?
        .ok_or_else(|| DomainError::not_found("no such application"))?;
    Ok(EffectiveConfig::for_app(&org, &app))
}
