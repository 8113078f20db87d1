//! Organization, Application and Inference Profile entities (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Where the daily budget is aggregated: the whole org, or per application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuotaScope {
    Org,
    App,
}

/// A credential's rotation state: current hash, and an optional previous
/// hash that remains valid until `grace_expiry`.
///
/// Raw secrets are never stored here — only their hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub client_id: String,
    pub current_hash: String,
    pub previous_hash: Option<String>,
    pub grace_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(client_id: String, hash: String, now: DateTime<Utc>) -> Self {
        Self {
            client_id,
            current_hash: hash,
            previous_hash: None,
            grace_expiry: None,
            created_at: now,
        }
    }
}

/// Per-field override of the effective ladder/quota, applied at the
/// application level over its organization's defaults. Closed shape —
/// no untyped map is round-tripped through the domain (spec.md §9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overrides {
    pub model_ordering: Option<Vec<String>>,
    pub quotas: Option<HashMap<String, u64>>,
    pub quota_scope: Option<QuotaScope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub org_id: Uuid,
    pub display_name: String,
    pub timezone: String,
    pub quota_scope: QuotaScope,
    pub model_ordering: Vec<String>,
    pub quotas: HashMap<String, u64>,
    pub shard_count: u32,
    pub credentials: CredentialRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn client_id(org_id: Uuid) -> String {
        format!("org-{org_id}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub org_id: Uuid,
    pub app_id: String,
    pub display_name: String,
    pub overrides: Overrides,
    pub credentials: CredentialRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn client_id(org_id: Uuid, app_id: &str) -> String {
        format!("org-{org_id}-app-{app_id}")
    }
}

/// The effective ladder/quota/scope after applying `org ⊕ app` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub org_id: Uuid,
    pub app_id: Option<String>,
    pub timezone: String,
    pub quota_scope: QuotaScope,
    pub model_ordering: Vec<String>,
    pub quotas: HashMap<String, u64>,
    pub shard_count: u32,
}

impl EffectiveConfig {
    /// Computes the app's effective config by overlaying its overrides on
    /// its organization's defaults, per field.
    pub fn for_app(org: &Organization, app: &Application) -> Self {
        Self {
            org_id: org.org_id,
            app_id: Some(app.app_id.clone()),
            timezone: org.timezone.clone(),
            quota_scope: app.overrides.quota_scope.unwrap_or(org.quota_scope),
            model_ordering: app
                .overrides
                .model_ordering
                .clone()
                .unwrap_or_else(|| org.model_ordering.clone()),
            quotas: app
                .overrides
                .quotas
                .clone()
                .unwrap_or_else(|| org.quotas.clone()),
            shard_count: org.shard_count,
        }
    }

    pub fn for_org(org: &Organization) -> Self {
        Self {
            org_id: org.org_id,
            app_id: None,
            timezone: org.timezone.clone(),
            quota_scope: org.quota_scope,
            model_ordering: org.model_ordering.clone(),
            quotas: org.quotas.clone(),
            shard_count: org.shard_count,
        }
    }

    /// Validates the `∀ label ∈ model_ordering: quotas[label] is defined` invariant (P3).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let missing: Vec<String> = self
            .model_ordering
            .iter()
            .filter(|label| !self.quotas.contains_key(*label))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

/// The authenticated caller identity, resolved from a client-id or a
/// verified token subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub org_id: Uuid,
    pub app_id: Option<String>,
    pub client_id: String,
}

/// A region-parameterised indirection to an underlying model identifier,
/// registered per application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceProfile {
    pub org_id: Uuid,
    pub app_id: String,
    pub label: String,
    pub arn: String,
    pub region_map: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn org_fixture() -> Organization {
        Organization {
            org_id: Uuid::nil(),
            display_name: "Acme".into(),
            timezone: "America/New_York".into(),
            quota_scope: QuotaScope::Org,
            model_ordering: vec!["premium".into(), "standard".into()],
            quotas: HashMap::from([("premium".into(), 1_000_000), ("standard".into(), 500_000)]),
            shard_count: 8,
            credentials: CredentialRecord::new("org-x".into(), "hash".into(), Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn app_overrides_ladder_but_inherits_scope() {
        let org = org_fixture();
        let app = Application {
            org_id: org.org_id,
            app_id: "app-1".into(),
            display_name: "App".into(),
            overrides: Overrides {
                model_ordering: Some(vec!["economy".into()]),
                quotas: Some(HashMap::from([("economy".into(), 10_000)])),
                quota_scope: None,
            },
            credentials: CredentialRecord::new("org-x-app-app-1".into(), "hash".into(), Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let effective = EffectiveConfig::for_app(&org, &app);
        assert_eq!(effective.quota_scope, QuotaScope::Org);
        assert_eq!(effective.model_ordering, vec!["economy".to_string()]);
        assert!(effective.validate().is_ok());
    }

    #[test]
    fn validate_reports_missing_quota() {
        let mut org = org_fixture();
        org.quotas.remove("standard");
        let effective = EffectiveConfig::for_org(&org);
        assert_eq!(effective.validate(), Err(vec!["standard".to_string()]));
    }
}
