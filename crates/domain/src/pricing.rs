//! Static pricebook and label-resolution types (spec.md §3, §4.E).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One process-wide pricebook entry, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticModelEntry {
    pub label: String,
    pub id: String,
    pub input_price_usd_micros_per_1m: u64,
    pub output_price_usd_micros_per_1m: u64,
}

/// The immutable, process-wide pricebook (spec.md §5 "the static pricebook
/// is immutable after startup"). Indexed two ways: by label (the
/// caller-facing name, used by the label resolver) and by identifier (the
/// underlying model id, used by the pricing resolver — a profile's region
/// map resolves to an identifier, never a label).
#[derive(Debug, Clone, Default)]
pub struct Pricebook {
    by_label: HashMap<String, StaticModelEntry>,
    by_identifier: HashMap<String, StaticModelEntry>,
}

impl Pricebook {
    pub fn from_entries(entries: Vec<StaticModelEntry>) -> Self {
        let by_label = entries.iter().cloned().map(|e| (e.label.clone(), e)).collect();
        let by_identifier = entries.into_iter().map(|e| (e.id.clone(), e)).collect();
        Self { by_label, by_identifier }
    }

    pub fn get(&self, label: &str) -> Option<&StaticModelEntry> {
        self.by_label.get(label)
    }

    pub fn get_by_identifier(&self, identifier: &str) -> Option<&StaticModelEntry> {
        self.by_identifier.get(identifier)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.by_label.keys().map(|s| s.as_str())
    }
}

/// The result of resolving a caller-supplied `model_label` (spec.md §4.E).
/// A closed variant, matched rather than dispatched virtually (spec.md §9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelResolution {
    Model {
        identifier: String,
    },
    Profile {
        identifier: String,
        pricing_region: String,
    },
}

impl LabelResolution {
    pub fn identifier(&self) -> &str {
        match self {
            LabelResolution::Model { identifier } => identifier,
            LabelResolution::Profile { identifier, .. } => identifier,
        }
    }

    pub fn pricing_region(&self) -> Option<&str> {
        match self {
            LabelResolution::Model { .. } => None,
            LabelResolution::Profile { pricing_region, .. } => Some(pricing_region),
        }
    }
}
