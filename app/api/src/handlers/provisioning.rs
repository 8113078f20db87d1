//! Org/app provisioning and credential rotation (spec.md §4.I, §6.1).
//! These routes sit behind the provisioning API key, not a bearer token.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use model_meter_domain::{
    Application, ApiError as DomainError, CredentialRecord, Organization, Overrides, QuotaScope,
};
use model_meter_security::{generate_secret, hash_secret};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UpsertOrgRequest {
    pub display_name: String,
    pub timezone: String,
    pub quota_scope: QuotaScope,
    pub model_ordering: Vec<String>,
    pub quotas: HashMap<String, u64>,
    pub shard_count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UpsertOrgResponse {
    pub org_id: Uuid,
    pub client_id: String,
    /// Present only when this call created the org; rotation is the only
    /// other operation that ever reveals a secret.
    pub client_secret: Option<String>,
}

fn validate_ladder(
    pricebook: &model_meter_domain::Pricebook,
    model_ordering: &[String],
    quotas: &HashMap<String, u64>,
) -> Result<(), ApiError> {
    let unknown: Vec<&String> = model_ordering.iter().filter(|l| !pricebook.contains(l)).collect();
    if !unknown.is_empty() {
        return Err(DomainError::invalid_config(format!(
            "model_ordering contains labels not in the static pricebook: {unknown:?}; valid labels: {:?}",
            pricebook.labels().collect::<Vec<_>>()
        ))
        .into());
    }
    let missing: Vec<&String> = model_ordering.iter().filter(|l| !quotas.contains_key(*l)).collect();
    if !missing.is_empty() {
        return Err(DomainError::invalid_config(format!("quotas is missing entries for: {missing:?}")).into());
    }
    Ok(())
}

pub async fn upsert_org(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<UpsertOrgRequest>,
) -> Result<Json<UpsertOrgResponse>, ApiError> {
    validate_ladder(state.pricing.pricebook(), &body.model_ordering, &body.quotas)?;

    let now = Utc::now();
    let client_id = Organization::client_id(org_id);
    let existing = state.store.get_organization(org_id).await?;

    let (credentials, client_secret) = match existing {
        Some(existing) => (existing.credentials, None),
        None => {
            let secret = generate_secret();
            let hash = hash_secret(&secret).map_err(|_| DomainError::internal("secret hashing failed"))?;
            (CredentialRecord::new(client_id.clone(), hash, now), Some(secret))
        }
    };

    let org = Organization {
        org_id,
        display_name: body.display_name,
        timezone: body.timezone,
        quota_scope: body.quota_scope,
        model_ordering: body.model_ordering,
        quotas: body.quotas,
        shard_count: body.shard_count.unwrap_or(state.default_shard_count),
        credentials,
        created_at: now,
        updated_at: now,
    };
    state.store.upsert_organization(&org).await?;

    Ok(Json(UpsertOrgResponse { org_id, client_id, client_secret }))
}

#[derive(Debug, Deserialize)]
pub struct UpsertAppRequest {
    pub display_name: String,
    pub overrides: Overrides,
}

#[derive(Debug, Serialize)]
pub struct UpsertAppResponse {
    pub org_id: Uuid,
    pub app_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}

pub async fn upsert_app(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
    Json(body): Json<UpsertAppRequest>,
) -> Result<Json<UpsertAppResponse>, ApiError> {
    let org = state
        .store
        .get_organization(org_id)
        .await?
        .ok_or_else(|| DomainError::invalid_config("org does not exist"))?;

    if let Some(ladder) = &body.overrides.model_ordering {
        let quotas = body.overrides.quotas.clone().unwrap_or_else(|| org.quotas.clone());
        validate_ladder(state.pricing.pricebook(), ladder, &quotas)?;
    }

    let now = Utc::now();
    let client_id = Application::client_id(org_id, &app_id);
    let existing = state.store.get_application(org_id, &app_id).await?;

    let (credentials, client_secret) = match existing {
        Some(existing) => (existing.credentials, None),
        None => {
            let secret = generate_secret();
            let hash = hash_secret(&secret).map_err(|_| DomainError::internal("secret hashing failed"))?;
            (CredentialRecord::new(client_id.clone(), hash, now), Some(secret))
        }
    };

    let app = Application {
        org_id,
        app_id: app_id.clone(),
        display_name: body.display_name,
        overrides: body.overrides,
        credentials,
        created_at: now,
        updated_at: now,
    };
    state.store.upsert_application(&app).await?;

    Ok(Json(UpsertAppResponse { org_id, app_id, client_id, client_secret }))
}

#[derive(Debug, Deserialize)]
pub struct RotateRequest {
    pub grace_hours: u64,
}

#[derive(Debug, Serialize)]
pub struct RotateResponse {
    pub client_secret: String,
}

pub async fn rotate_org_credentials(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<RotateRequest>,
) -> Result<Json<RotateResponse>, ApiError> {
    let secret = model_meter_security::rotate_organization(&state.store, org_id, body.grace_hours).await?;
    Ok(Json(RotateResponse { client_secret: secret }))
}

pub async fn rotate_app_credentials(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
    Json(body): Json<RotateRequest>,
) -> Result<Json<RotateResponse>, ApiError> {
    let secret = model_meter_security::rotate_application(&state.store, org_id, &app_id, body.grace_hours).await?;
    Ok(Json(RotateResponse { client_secret: secret }))
}
