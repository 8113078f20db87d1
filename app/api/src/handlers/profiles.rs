//! Inference profile registration and lookup (spec.md §4.E, §6.1).

use crate::error::ApiError;
use crate::middleware::authorize_path;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use model_meter_domain::{ApiError as DomainError, Subject};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterProfileRequest {
    pub label: String,
    pub arn: String,
    pub region_map: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub label: String,
    pub arn: String,
    pub region_map: HashMap<String, String>,
}

pub async fn register_profile(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
    Json(body): Json<RegisterProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;

    model_meter_pricing::register_profile(
        &state.store,
        org_id,
        &app_id,
        &body.label,
        &body.arn,
        body.region_map.clone(),
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse { label: body.label, arn: body.arn, region_map: body.region_map }),
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id, label)): Path<(Uuid, String, String)>,
) -> Result<Json<ProfileResponse>, ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;

    let profile = state
        .store
        .get_profile(org_id, &app_id, &label)
        .await?
        .ok_or_else(|| DomainError::not_found("no inference profile registered under that label"))?;

    Ok(Json(ProfileResponse { label: profile.label, arn: profile.arn, region_map: profile.region_map }))
}

pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;

    let profiles = state.store.list_profiles(org_id, &app_id).await?;
    Ok(Json(
        profiles
            .into_iter()
            .map(|p| ProfileResponse { label: p.label, arn: p.arn, region_map: p.region_map })
            .collect(),
    ))
}
