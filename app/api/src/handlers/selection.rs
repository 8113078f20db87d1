//! `GET .../model-selection` (spec.md §4.G, §6.1).

use crate::error::ApiError;
use crate::middleware::authorize_path;
use crate::resolve::effective_config_for_app;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use model_meter_domain::Subject;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub label: String,
    pub mode: model_meter_domain::ModeAdvisory,
    pub recheck_interval_secs: u64,
    pub sticky_fallback_active: bool,
    pub reason: model_meter_domain::StickyReason,
}

pub async fn get_selection(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
) -> Result<Json<SelectionResponse>, ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;

    let config = effective_config_for_app(&state, org_id, &app_id).await?;
    let now = state.clock.now();
    let day = state
        .clock
        .day_in(&config.timezone, now)
        .map_err(|e| model_meter_domain::ApiError::invalid_config(e.to_string()))?;

    let rec = model_meter_selection::select(&state.store, &config, &day, now).await?;
    Ok(Json(SelectionResponse {
        label: rec.label,
        mode: rec.mode,
        recheck_interval_secs: rec.recheck_interval_secs,
        sticky_fallback_active: rec.sticky_fallback_active,
        reason: rec.reason,
    }))
}
