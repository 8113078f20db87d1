//! Label resolution (spec.md §4.E): a caller-supplied `model_label` maps
//! to either a registered inference profile (region-parameterised) or a
//! static model, never both.

use crate::errors::PricingError;
use chrono::{DateTime, Utc};
use model_meter_domain::{InferenceProfile, LabelResolution, Pricebook};
use model_meter_store::Store;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use uuid::Uuid;

static ARN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^arn:aws:bedrock:[a-z0-9-]+:\d{12}:inference-profile/[A-Za-z0-9._-]+$").expect("static ARN regex")
});

/// Resolves `label` against `(org_id, app_id)`'s registered profiles
/// first, then the static pricebook, per spec.md §4.E.
pub async fn resolve_label(
    store: &Store,
    pricebook: &Pricebook,
    org_id: Uuid,
    app_id: &str,
    label: &str,
    calling_region: Option<&str>,
) -> Result<LabelResolution, PricingError> {
    if let Some(profile) = store.get_profile(org_id, app_id, label).await? {
        let region = calling_region.ok_or(PricingError::MissingCallingRegion)?;
        let identifier = profile
            .region_map
            .get(region)
            .ok_or_else(|| PricingError::UnsupportedRegion(region.to_string()))?;
        return Ok(LabelResolution::Profile { identifier: identifier.clone(), pricing_region: region.to_string() });
    }

    if let Some(entry) = pricebook.get(label) {
        return Ok(LabelResolution::Model { identifier: entry.id.clone() });
    }

    Err(PricingError::UnknownLabel(label.to_string()))
}

/// Validates an inference-profile ARN shape and persists the region map
/// an upstream profile-describe call returned. The upstream describe call
/// itself is mocked behind this boundary per spec.md §1's out-of-scope list.
pub async fn register_profile(
    store: &Store,
    org_id: Uuid,
    app_id: &str,
    label: &str,
    arn: &str,
    region_map: HashMap<String, String>,
    now: DateTime<Utc>,
) -> Result<(), PricingError> {
    if !ARN_PATTERN.is_match(arn) {
        return Err(PricingError::MalformedArn(arn.to_string()));
    }
    if region_map.is_empty() {
        return Err(PricingError::EmptyRegionMap);
    }

    let profile = InferenceProfile {
        org_id,
        app_id: app_id.to_string(),
        label: label.to_string(),
        arn: arn.to_string(),
        region_map,
        created_at: now,
    };
    store.register_profile(&profile).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_arn() {
        assert!(ARN_PATTERN.is_match("arn:aws:bedrock:us-east-1:123456789012:inference-profile/tenant-x"));
    }

    #[test]
    fn rejects_malformed_arn() {
        assert!(!ARN_PATTERN.is_match("arn:aws:bedrock:us-east-1:not-12-digits:inference-profile/tenant-x"));
        assert!(!ARN_PATTERN.is_match("not-an-arn-at-all"));
    }

    #[tokio::test]
    async fn resolves_static_label_when_no_profile_registered() {
        use model_meter_domain::StaticModelEntry;

        let store = Store::connect(":memory:", None).await.unwrap();
        let pricebook = Pricebook::from_entries(vec![StaticModelEntry {
            label: "premium".into(),
            id: "model-a".into(),
            input_price_usd_micros_per_1m: 3_000_000,
            output_price_usd_micros_per_1m: 15_000_000,
        }]);

        let resolution = resolve_label(&store, &pricebook, Uuid::new_v4(), "app-1", "premium", None)
            .await
            .unwrap();
        assert_eq!(resolution, LabelResolution::Model { identifier: "model-a".to_string() });
    }

    #[tokio::test]
    async fn profile_label_without_calling_region_is_invalid_request() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let pricebook = Pricebook::default();
        let org_id = Uuid::new_v4();

        register_profile(
            &store,
            org_id,
            "app-1",
            "tenant-x",
            "arn:aws:bedrock:us-east-1:123456789012:inference-profile/tenant-x",
            HashMap::from([("us-east-1".to_string(), "model-a".to_string())]),
            Utc::now(),
        )
        .await
        .unwrap();

        let result = resolve_label(&store, &pricebook, org_id, "app-1", "tenant-x", None).await;
        assert!(matches!(result, Err(PricingError::MissingCallingRegion)));
    }

    #[tokio::test]
    async fn profile_label_resolves_model_for_known_region() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let pricebook = Pricebook::default();
        let org_id = Uuid::new_v4();

        register_profile(
            &store,
            org_id,
            "app-1",
            "tenant-x",
            "arn:aws:bedrock:us-east-1:123456789012:inference-profile/tenant-x",
            HashMap::from([
                ("us-east-1".to_string(), "model-a".to_string()),
                ("us-west-2".to_string(), "model-a".to_string()),
            ]),
            Utc::now(),
        )
        .await
        .unwrap();

        let resolution = resolve_label(&store, &pricebook, org_id, "app-1", "tenant-x", Some("us-west-2"))
            .await
            .unwrap();
        assert_eq!(
            resolution,
            LabelResolution::Profile { identifier: "model-a".to_string(), pricing_region: "us-west-2".to_string() }
        );
    }
}
