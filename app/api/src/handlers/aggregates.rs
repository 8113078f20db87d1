//! `GET .../aggregates/*` (spec.md §4.H, §6.1): live "today" view and the
//! historical-by-date view, for both org and app scope.

use crate::error::ApiError;
use crate::middleware::authorize_path;
use crate::resolve::{effective_config_for_app, effective_config_for_org};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use model_meter_domain::{ApiError as DomainError, DayKey, Subject};
use model_meter_selection::{daily_summary, DailySummary};
use uuid::Uuid;

async fn today_for(state: &AppState, config: &model_meter_domain::EffectiveConfig) -> Result<DailySummary, ApiError> {
    let now = state.clock.now();
    let today = state
        .clock
        .day_in(&config.timezone, now)
        .map_err(|e| DomainError::invalid_config(e.to_string()))?;
    Ok(daily_summary(&state.store, config, today, today, state.retention_days, now).await?)
}

async fn historical_for(
    state: &AppState,
    config: &model_meter_domain::EffectiveConfig,
    date: &str,
) -> Result<DailySummary, ApiError> {
    let requested = DayKey::parse_iso(date).ok_or_else(|| DomainError::invalid_request("date must be YYYY-MM-DD"))?;
    let now = state.clock.now();
    let today = state
        .clock
        .day_in(&config.timezone, now)
        .map_err(|e| DomainError::invalid_config(e.to_string()))?;
    Ok(daily_summary(&state.store, config, requested, today, state.retention_days, now).await?)
}

pub async fn org_today(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<DailySummary>, ApiError> {
    authorize_path(&subject, org_id, None)?;
    let config = effective_config_for_org(&state, org_id).await?;
    Ok(Json(today_for(&state, &config).await?))
}

pub async fn app_today(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
) -> Result<Json<DailySummary>, ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;
    let config = effective_config_for_app(&state, org_id, &app_id).await?;
    Ok(Json(today_for(&state, &config).await?))
}

pub async fn org_historical(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, date)): Path<(Uuid, String)>,
) -> Result<Json<DailySummary>, ApiError> {
    authorize_path(&subject, org_id, None)?;
    let config = effective_config_for_org(&state, org_id).await?;
    Ok(Json(historical_for(&state, &config, &date).await?))
}

pub async fn app_historical(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id, date)): Path<(Uuid, String, String)>,
) -> Result<Json<DailySummary>, ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;
    let config = effective_config_for_app(&state, org_id, &app_id).await?;
    Ok(Json(historical_for(&state, &config, &date).await?))
}
