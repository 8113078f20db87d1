//! Pure quota-ladder evaluation (spec.md §4.G) — no I/O, so the selection
//! state machine's hard logic is unit-testable without a store.

use model_meter_domain::{DailyTotal, ModeAdvisory};
use std::collections::HashMap;

pub const TIGHT_THRESHOLD: f64 = 0.95;

/// The smallest-index label still under its quota, or `None` if every
/// label in the ladder has reached or exceeded its quota.
pub fn first_under_quota(
    ladder: &[String],
    totals: &HashMap<String, DailyTotal>,
    quotas: &HashMap<String, u64>,
) -> Option<usize> {
    ladder.iter().position(|label| {
        let spent = totals.get(label).map(|t| t.cost_micros).unwrap_or(0);
        let quota = quotas.get(label).copied().unwrap_or(0);
        spent < quota
    })
}

/// `spend / quota` for one label, saturating at `0.0` when the quota is
/// zero (an org with a zero-budget label is always "at quota").
pub fn quota_pct(spend_micros: u64, quota_micros: u64) -> f64 {
    if quota_micros == 0 {
        1.0
    } else {
        spend_micros as f64 / quota_micros as f64
    }
}

pub fn mode_for(pct: f64) -> ModeAdvisory {
    if pct >= TIGHT_THRESHOLD {
        ModeAdvisory::Tight
    } else {
        ModeAdvisory::Normal
    }
}
