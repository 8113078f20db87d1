//! `submit_usage` orchestration (spec.md §4.F): label resolution, pricing,
//! and the idempotent sharded write, composed behind one entry point.

use crate::clock::Clock;
use crate::errors::MeteringError;
use crate::sharding::shard_index;
use chrono::{DateTime, Duration, Utc};
use model_meter_domain::{CostBreakdown, DayKey, EffectiveConfig, ScopeKey, UsageStatus};
use model_meter_pricing::{resolve_and_price, PricingResolver};
use model_meter_store::Store;

const SKEW_TOLERANCE_FUTURE: Duration = Duration::minutes(5);
const STALENESS_TOLERANCE_PAST_HOURS: i64 = 24;
const DEFAULT_RETENTION_DAYS: i64 = 32;

pub struct SubmitUsageRequest<'a> {
    pub request_id: &'a str,
    pub label: &'a str,
    pub supplied_model_id: Option<&'a str>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub status: UsageStatus,
    pub timestamp: DateTime<Utc>,
    pub calling_region: Option<&'a str>,
}

pub struct SubmitUsageOutcome {
    /// `true` if this call recorded a new contribution; `false` if
    /// `request_id` had already been applied (idempotent replay). Both
    /// cases are "accepted" from the caller's point of view.
    pub is_new: bool,
    pub cost: CostBreakdown,
    pub day_key: DayKey,
}

/// Validates the submitted clock against clock skew/staleness tolerances.
fn validate_timestamp(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), MeteringError> {
    if timestamp > now + SKEW_TOLERANCE_FUTURE || timestamp < now - Duration::hours(STALENESS_TOLERANCE_PAST_HOURS) {
        return Err(MeteringError::TimestampOutOfRange { submitted: timestamp, now });
    }
    Ok(())
}

/// Scope-key for a submission, given the effective `quota_scope` — org
/// scope ignores the app entirely, even when one is present on the path.
fn scope_for(config: &EffectiveConfig) -> ScopeKey {
    match (config.quota_scope, &config.app_id) {
        (model_meter_domain::QuotaScope::App, Some(app_id)) => ScopeKey::app(config.org_id, app_id.clone()),
        _ => ScopeKey::org(config.org_id),
    }
}

pub async fn submit_usage(
    store: &Store,
    resolver: &PricingResolver,
    clock: &dyn Clock,
    config: &EffectiveConfig,
    request: SubmitUsageRequest<'_>,
) -> Result<SubmitUsageOutcome, MeteringError> {
    let now = clock.now();
    validate_timestamp(request.timestamp, now)?;

    // Day-key is computed from `now`, not the submitted timestamp: the
    // aggregate is a live budget, not a historical journal, so a
    // late-arriving submission still lands on today (spec.md's resolved
    // open question — the alternative of using the submission's own day
    // was considered and rejected).
    let day_key = clock.day_in(&config.timezone, now)?;
    let scope = scope_for(config);

    let cost = match request.status {
        UsageStatus::Success => {
            let (_resolution, cost) = resolve_and_price(
                store,
                resolver,
                config.org_id,
                config.app_id.as_deref().unwrap_or(""),
                request.label,
                request.calling_region,
                request.input_tokens,
                request.output_tokens,
                &day_key.to_string(),
                now,
            )
            .await?;
            tracing::debug!(supplied_model_id = ?request.supplied_model_id, "priced usage submission");
            cost
        }
        UsageStatus::Error => CostBreakdown::zero(),
    };

    let shard = shard_index(request.request_id, config.shard_count);

    let is_new = store
        .apply_usage_shard(
            &scope.to_string(),
            &day_key.to_string(),
            request.label,
            shard,
            request.request_id,
            cost.cost_micros,
            request.input_tokens,
            request.output_tokens,
            now,
            DEFAULT_RETENTION_DAYS,
        )
        .await?;

    Ok(SubmitUsageOutcome { is_new, cost, day_key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use model_meter_domain::{Pricebook, QuotaScope, StaticModelEntry};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn config(org_id: Uuid) -> EffectiveConfig {
        EffectiveConfig {
            org_id,
            app_id: None,
            timezone: "UTC".into(),
            quota_scope: QuotaScope::Org,
            model_ordering: vec!["premium".into()],
            quotas: HashMap::from([("premium".into(), 1_000_000)]),
            shard_count: 8,
        }
    }

    fn pricebook() -> Pricebook {
        Pricebook::from_entries(vec![StaticModelEntry {
            label: "premium".into(),
            id: "model-a".into(),
            input_price_usd_micros_per_1m: 3_000_000,
            output_price_usd_micros_per_1m: 15_000_000,
        }])
    }

    #[tokio::test]
    async fn repeated_request_id_is_idempotent() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let resolver = PricingResolver::new(pricebook());
        let now = Utc::now();
        let clock = FixedClock(now);
        let cfg = config(Uuid::new_v4());

        let req = || SubmitUsageRequest {
            request_id: "req-1",
            label: "premium",
            supplied_model_id: Some("model-a"),
            input_tokens: 1500,
            output_tokens: 800,
            status: UsageStatus::Success,
            timestamp: now,
            calling_region: None,
        };

        let first = submit_usage(&store, &resolver, &clock, &cfg, req()).await.unwrap();
        assert!(first.is_new);
        assert_eq!(first.cost.cost_micros, 16_500);

        let second = submit_usage(&store, &resolver, &clock, &cfg, req()).await.unwrap();
        assert!(!second.is_new);

        let total = store
            .daily_total(&ScopeKey::org(cfg.org_id).to_string(), &first.day_key.to_string(), "premium", 8, now)
            .await
            .unwrap();
        assert_eq!(total.cost_micros, 16_500);
        assert_eq!(total.requests, 1);
    }

    #[tokio::test]
    async fn error_status_counts_tokens_but_not_cost() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let resolver = PricingResolver::new(pricebook());
        let now = Utc::now();
        let clock = FixedClock(now);
        let cfg = config(Uuid::new_v4());

        let outcome = submit_usage(
            &store,
            &resolver,
            &clock,
            &cfg,
            SubmitUsageRequest {
                request_id: "req-err",
                label: "premium",
                supplied_model_id: None,
                input_tokens: 200,
                output_tokens: 100,
                status: UsageStatus::Error,
                timestamp: now,
                calling_region: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.cost.cost_micros, 0);
        let total = store
            .daily_total(&ScopeKey::org(cfg.org_id).to_string(), &outcome.day_key.to_string(), "premium", 8, now)
            .await
            .unwrap();
        assert_eq!(total.input_tokens, 200);
        assert_eq!(total.cost_micros, 0);
    }

    #[tokio::test]
    async fn rejects_timestamp_too_far_in_future() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let resolver = PricingResolver::new(pricebook());
        let now = Utc::now();
        let clock = FixedClock(now);
        let cfg = config(Uuid::new_v4());

        let result = submit_usage(
            &store,
            &resolver,
            &clock,
            &cfg,
            SubmitUsageRequest {
                request_id: "req-future",
                label: "premium",
                supplied_model_id: None,
                input_tokens: 1,
                output_tokens: 1,
                status: UsageStatus::Success,
                timestamp: now + Duration::minutes(10),
                calling_region: None,
            },
        )
        .await;

        assert!(matches!(result, Err(MeteringError::TimestampOutOfRange { .. })));
    }

    #[tokio::test]
    async fn rejects_stale_timestamp() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let resolver = PricingResolver::new(pricebook());
        let now = Utc::now();
        let clock = FixedClock(now);
        let cfg = config(Uuid::new_v4());

        let result = submit_usage(
            &store,
            &resolver,
            &clock,
            &cfg,
            SubmitUsageRequest {
                request_id: "req-stale",
                label: "premium",
                supplied_model_id: None,
                input_tokens: 1,
                output_tokens: 1,
                status: UsageStatus::Success,
                timestamp: now - Duration::hours(25),
                calling_region: None,
            },
        )
        .await;

        assert!(matches!(result, Err(MeteringError::TimestampOutOfRange { .. })));
    }
}
