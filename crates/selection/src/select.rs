//! The model-selection engine (spec.md §4.G): quota-ladder evaluation
//! composed with the sticky-fallback state machine, evaluated inline on
//! every selection request — no background task is required.

use crate::errors::{LabelQuotaDetail, SelectionError};
use crate::ladder::{first_under_quota, mode_for, quota_pct};
use chrono::{DateTime, Utc};
use model_meter_domain::{DayKey, EffectiveConfig, Recommendation, ScopeKey, StickyReason, StickyState};
use model_meter_store::Store;

/// Scope-key for a (org, app, effective quota_scope) triple — mirrors
/// `model_meter_metering::submit::scope_for`, duplicated rather than
/// shared because each crate's orchestration owns its own I/O boundary.
fn scope_for(config: &EffectiveConfig) -> ScopeKey {
    match (config.quota_scope, &config.app_id) {
        (model_meter_domain::QuotaScope::App, Some(app_id)) => ScopeKey::app(config.org_id, app_id.clone()),
        _ => ScopeKey::org(config.org_id),
    }
}

fn build_detail(
    ladder: &[String],
    totals: &std::collections::HashMap<String, model_meter_domain::DailyTotal>,
    quotas: &std::collections::HashMap<String, u64>,
) -> Vec<LabelQuotaDetail> {
    ladder
        .iter()
        .map(|label| {
            let cost_micros = totals.get(label).map(|t| t.cost_micros).unwrap_or(0);
            let quota_micros = quotas.get(label).copied().unwrap_or(0);
            LabelQuotaDetail { label: label.clone(), cost_micros, quota_micros, quota_pct: quota_pct(cost_micros, quota_micros) }
        })
        .collect()
}

/// Computes the model-selection recommendation for `config` as of `now`,
/// applying and persisting any sticky-fallback transition the current
/// totals demand.
pub async fn select(store: &Store, config: &EffectiveConfig, day_key: &DayKey, now: DateTime<Utc>) -> Result<Recommendation, SelectionError> {
    let scope = scope_for(config).to_string();
    let day = day_key.to_string();

    let totals = store
        .daily_totals_batch(&scope, &day, &config.model_ordering, config.shard_count, now)
        .await?;

    let first = first_under_quota(&config.model_ordering, &totals, &config.quotas);
    let existing_sticky = store.get_sticky(&scope, &day).await?;

    let resolved = resolve_sticky(store, &scope, &day, &config.model_ordering, first, existing_sticky, now).await?;

    let Some((index, label)) = resolved else {
        return Err(SelectionError::QuotaExceeded { detail: build_detail(&config.model_ordering, &totals, &config.quotas) });
    };

    let spend = totals.get(&label).map(|t| t.cost_micros).unwrap_or(0);
    let quota = config.quotas.get(&label).copied().unwrap_or(0);
    let pct = quota_pct(spend, quota);

    let sticky_fallback_active = index > 0;
    let reason = if sticky_fallback_active { StickyReason::QuotaExceeded } else { StickyReason::Normal };

    Ok(Recommendation {
        label,
        mode: mode_for(pct),
        recheck_interval_secs: mode_for(pct).recheck_interval_secs(),
        sticky_fallback_active,
        reason,
    })
}

/// Applies the sticky-fallback transition rules and returns the
/// `(index, label)` to recommend, or `None` if every label is exhausted
/// and there is no sticky state pointing at a still-viable label.
async fn resolve_sticky(
    store: &Store,
    scope: &str,
    day: &str,
    ladder: &[String],
    first: Option<usize>,
    existing: Option<StickyState>,
    now: DateTime<Utc>,
) -> Result<Option<(usize, String)>, SelectionError> {
    match (existing, first) {
        (None, None) => Ok(None),
        (None, Some(0)) => Ok(Some((0, ladder[0].clone()))),
        (None, Some(j)) => {
            // null -> sticky(j): l0..lj-1 are over quota by construction of
            // `first_under_quota` returning j as the smallest under-quota index.
            let label = ladder[j].clone();
            store
                .try_promote_sticky(scope, day, j, &label, StickyReason::QuotaExceeded, now, Some(&ladder[0]))
                .await?;
            // Re-read regardless of whether our own promote won the race:
            // another concurrent promote may have landed a different (but
            // still valid) index, and either way the stored state is truth.
            let state = store.get_sticky(scope, day).await?.expect("just promoted or raced with a promote");
            Ok(Some((state.active_index, state.active_label)))
        }
        (Some(state), None) => {
            // Every label is over quota, including the sticky one: truly exhausted.
            let _ = state;
            Ok(None)
        }
        (Some(state), Some(j)) if j > state.active_index => {
            let label = ladder[j].clone();
            store
                .try_advance_sticky(scope, day, j, &label, StickyReason::QuotaExceeded, now, Some(&state.active_label))
                .await?;
            let refreshed = store.get_sticky(scope, day).await?.expect("sticky state exists once promoted");
            Ok(Some((refreshed.active_index, refreshed.active_label)))
        }
        (Some(state), Some(_)) => {
            // j <= active_index: sticky never retreats, stay put.
            Ok(Some((state.active_index, state.active_label)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_meter_domain::QuotaScope;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn config(org_id: Uuid) -> EffectiveConfig {
        EffectiveConfig {
            org_id,
            app_id: None,
            timezone: "UTC".into(),
            quota_scope: QuotaScope::Org,
            model_ordering: vec!["premium".into(), "standard".into(), "economy".into()],
            quotas: HashMap::from([("premium".into(), 1_000), ("standard".into(), 1_000), ("economy".into(), 1_000)]),
            shard_count: 8,
        }
    }

    #[tokio::test]
    async fn recommends_first_label_when_nothing_is_spent() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let cfg = config(Uuid::new_v4());
        let now = Utc::now();
        let day = DayKey::from_date(now.date_naive());

        let rec = select(&store, &cfg, &day, now).await.unwrap();
        assert_eq!(rec.label, "premium");
        assert!(!rec.sticky_fallback_active);
    }

    #[tokio::test]
    async fn promotes_to_sticky_fallback_when_premium_exhausted() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let cfg = config(Uuid::new_v4());
        let now = Utc::now();
        let day = DayKey::from_date(now.date_naive());
        let scope = ScopeKey::org(cfg.org_id).to_string();

        store
            .apply_usage_shard(&scope, &day.to_string(), "premium", 0, "req-1", 1_000, 10, 10, now, 32)
            .await
            .unwrap();

        let rec = select(&store, &cfg, &day, now).await.unwrap();
        assert_eq!(rec.label, "standard");
        assert!(rec.sticky_fallback_active);

        // Stays pinned on a second call even if premium somehow looked
        // under quota again (sticky never retreats).
        let rec_again = select(&store, &cfg, &day, now).await.unwrap();
        assert_eq!(rec_again.label, "standard");
    }

    #[tokio::test]
    async fn quota_exceeded_when_every_label_is_over() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let cfg = config(Uuid::new_v4());
        let now = Utc::now();
        let day = DayKey::from_date(now.date_naive());
        let scope = ScopeKey::org(cfg.org_id).to_string();

        for label in &cfg.model_ordering {
            store
                .apply_usage_shard(&scope, &day.to_string(), label, 0, &format!("req-{label}"), 1_000, 10, 10, now, 32)
                .await
                .unwrap();
        }

        let result = select(&store, &cfg, &day, now).await;
        assert!(matches!(result, Err(SelectionError::QuotaExceeded { .. })));
    }
}
