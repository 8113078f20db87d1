//! `POST .../usage` and `POST .../usage/batch` (spec.md §4.F, §6.1).

use crate::error::ApiError;
use crate::middleware::authorize_path;
use crate::resolve::effective_config_for_app;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use model_meter_domain::{ApiError as DomainError, Subject, UsageStatus};
use model_meter_metering::{submit_usage, SubmitUsageRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct UsageRecordRequest {
    pub request_id: String,
    pub label: String,
    pub supplied_model_id: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub status: UsageStatus,
    pub timestamp: DateTime<Utc>,
    pub calling_region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsageRecordResponse {
    pub request_id: String,
    pub is_new: bool,
    pub cost_micros: u64,
    pub day: String,
}

async fn apply_one(
    state: &AppState,
    config: &model_meter_domain::EffectiveConfig,
    record: &UsageRecordRequest,
) -> Result<UsageRecordResponse, ApiError> {
    let outcome = submit_usage(
        &state.store,
        &state.pricing,
        state.clock.as_ref(),
        config,
        SubmitUsageRequest {
            request_id: &record.request_id,
            label: &record.label,
            supplied_model_id: record.supplied_model_id.as_deref(),
            input_tokens: record.input_tokens,
            output_tokens: record.output_tokens,
            status: record.status,
            timestamp: record.timestamp,
            calling_region: record.calling_region.as_deref(),
        },
    )
    .await?;

    Ok(UsageRecordResponse {
        request_id: record.request_id.clone(),
        is_new: outcome.is_new,
        cost_micros: outcome.cost.cost_micros,
        day: outcome.day_key.to_string(),
    })
}

pub async fn submit_one(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
    Json(record): Json<UsageRecordRequest>,
) -> Result<(StatusCode, Json<UsageRecordResponse>), ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;
    let config = effective_config_for_app(&state, org_id, &app_id).await?;
    let response = apply_one(&state, &config, &record).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub request_id: String,
    pub status: u16,
    pub result: Option<UsageRecordResponse>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItemResult>,
}

pub async fn submit_batch(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((org_id, app_id)): Path<(Uuid, String)>,
    Json(records): Json<Vec<UsageRecordRequest>>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    authorize_path(&subject, org_id, Some(&app_id))?;

    if records.is_empty() {
        return Err(DomainError::invalid_request("batch must contain at least one record").into());
    }
    if records.len() > MAX_BATCH_SIZE {
        return Err(DomainError::invalid_request(format!(
            "batch size {} exceeds the maximum of {MAX_BATCH_SIZE}",
            records.len()
        ))
        .into());
    }

    let config = effective_config_for_app(&state, org_id, &app_id).await?;

    let mut results = Vec::with_capacity(records.len());
    for record in &records {
        match apply_one(&state, &config, record).await {
            Ok(response) => results.push(BatchItemResult {
                request_id: response.request_id.clone(),
                status: StatusCode::ACCEPTED.as_u16(),
                result: Some(response),
                error: None,
            }),
            Err(err) => results.push(BatchItemResult {
                request_id: record.request_id.clone(),
                status: err.code().http_status(),
                result: None,
                error: Some(err.message()),
            }),
        }
    }

    Ok((StatusCode::MULTI_STATUS, Json(BatchResponse { results })))
}
