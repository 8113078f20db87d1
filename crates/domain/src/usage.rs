//! Usage-submission types and the cost-derivation function (spec.md §4.D, §4.F).

use serde::{Deserialize, Serialize};

/// The caller-reported outcome of the underlying inference call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UsageStatus {
    Success,
    Error,
}

/// Server-computed cost, in integer micro-USD, for one usage submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_micros: u64,
    pub output_micros: u64,
    pub cost_micros: u64,
}

impl CostBreakdown {
    /// Deterministic integer-arithmetic cost derivation (spec.md §4.D, P4).
    ///
    /// Division floors toward zero; this must match bit-for-bit across any
    /// reimplementation, so it is never done in floating point.
    pub fn derive(
        input_tokens: u64,
        output_tokens: u64,
        input_price_per_million: u64,
        output_price_per_million: u64,
    ) -> Self {
        let input_micros = (input_tokens as u128 * input_price_per_million as u128) / 1_000_000;
        let output_micros = (output_tokens as u128 * output_price_per_million as u128) / 1_000_000;
        let cost_micros = input_micros + output_micros;
        Self {
            input_micros: input_micros as u64,
            output_micros: output_micros as u64,
            cost_micros: cost_micros as u64,
        }
    }

    /// Cost allocation for an `ERROR`-status submission is zero; tokens
    /// are still counted by the caller (spec.md §9 open question resolution).
    pub fn zero() -> Self {
        Self {
            input_micros: 0,
            output_micros: 0,
            cost_micros: 0,
        }
    }
}

/// The componentwise sum of all shards for a (scope, day, label) triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub cost_micros: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub requests: u64,
}

impl DailyTotal {
    pub fn add(&mut self, other: &DailyTotal) {
        self.cost_micros += other.cost_micros;
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.requests += other.requests;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_toward_zero() {
        // 1 token at 3 micros/million floors to 0, not rounds to 1.
        let cost = CostBreakdown::derive(1, 0, 3, 0);
        assert_eq!(cost.input_micros, 0);
    }

    #[test]
    fn matches_worked_example_from_spec() {
        // premium priced 3 / 15 $ per 1M -> micro-USD per 1M is price * 1_000_000
        let cost = CostBreakdown::derive(1500, 800, 3_000_000, 15_000_000);
        assert_eq!(cost.cost_micros, 16_500);
    }
}
