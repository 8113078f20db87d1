//! Model-selection and sticky-fallback types (spec.md §3, §4.G).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the current recommendation is what it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StickyReason {
    Normal,
    QuotaExceeded,
}

/// The persisted sticky-fallback state for a (scope, day) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickyState {
    pub active_index: usize,
    pub active_label: String,
    pub reason: StickyReason,
    pub since: DateTime<Utc>,
    pub displaced_label: Option<String>,
}

/// Advisory polling cadence communicated to the client (spec.md §4.G "Mode advisory").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModeAdvisory {
    Tight,
    Normal,
}

impl ModeAdvisory {
    pub fn recheck_interval_secs(self) -> u64 {
        match self {
            ModeAdvisory::Tight => 60,
            ModeAdvisory::Normal => 300,
        }
    }
}

/// The response to a model-selection request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub label: String,
    pub mode: ModeAdvisory,
    pub recheck_interval_secs: u64,
    pub sticky_fallback_active: bool,
    pub reason: StickyReason,
}
