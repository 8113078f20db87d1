//! Aggregates projector (spec.md §4.H): read-model composition for a
//! (scope, date) tuple, used by both the live "today" view and the
//! historical-aggregate route.

use crate::errors::SelectionError;
use crate::ladder::quota_pct;
use chrono::{DateTime, Utc};
use model_meter_domain::{DailyTotal, DayKey, EffectiveConfig, ScopeKey, StickyState};
use model_meter_store::Store;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateStatus {
    Normal,
    Exceeded,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelAggregate {
    pub label: String,
    pub cost_micros: u64,
    pub quota_micros: u64,
    pub quota_pct: f64,
    pub status: AggregateStatus,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub requests: u64,
    pub avg_cost_per_request_micros: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub day: String,
    pub labels: Vec<LabelAggregate>,
    pub totals: DailyTotal,
    pub sticky: Option<StickyState>,
}

fn scope_for(config: &EffectiveConfig) -> ScopeKey {
    match (config.quota_scope, &config.app_id) {
        (model_meter_domain::QuotaScope::App, Some(app_id)) => ScopeKey::app(config.org_id, app_id.clone()),
        _ => ScopeKey::org(config.org_id),
    }
}

/// Composes the daily summary for `requested_day`, validating it against
/// `today` and the retention window before reading anything.
pub async fn daily_summary(
    store: &Store,
    config: &EffectiveConfig,
    requested_day: DayKey,
    today: DayKey,
    retention_days: i64,
    now: DateTime<Utc>,
) -> Result<DailySummary, SelectionError> {
    if requested_day.date() > today.date() {
        return Err(SelectionError::InvalidDate);
    }
    if requested_day.date() < today.date() - chrono::Duration::days(retention_days) {
        return Err(SelectionError::NotFound);
    }

    let scope = scope_for(config).to_string();
    let day = requested_day.to_string();

    let totals = store
        .daily_totals_batch(&scope, &day, &config.model_ordering, config.shard_count, now)
        .await?;
    let sticky = store.get_sticky(&scope, &day).await?;

    let mut aggregate_totals = DailyTotal::default();
    let labels = config
        .model_ordering
        .iter()
        .map(|label| {
            let total = totals.get(label).copied().unwrap_or_default();
            aggregate_totals.add(&total);
            let quota_micros = config.quotas.get(label).copied().unwrap_or(0);
            let pct = quota_pct(total.cost_micros, quota_micros);
            let avg_cost_per_request_micros = if total.requests == 0 { 0 } else { total.cost_micros / total.requests };
            LabelAggregate {
                label: label.clone(),
                cost_micros: total.cost_micros,
                quota_micros,
                quota_pct: pct,
                status: if total.cost_micros < quota_micros { AggregateStatus::Normal } else { AggregateStatus::Exceeded },
                input_tokens: total.input_tokens,
                output_tokens: total.output_tokens,
                requests: total.requests,
                avg_cost_per_request_micros,
            }
        })
        .collect();

    Ok(DailySummary { day, labels, totals: aggregate_totals, sticky })
}
