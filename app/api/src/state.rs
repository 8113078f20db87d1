//! Shared, immutable-after-startup application state (spec.md §5's
//! "global mutable state" allowlist: the pricing memo, the signing key,
//! the clock).

use crate::config::Config;
use model_meter_metering::{Clock, SystemClock};
use model_meter_pricing::PricingResolver;
use model_meter_store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub pricing: Arc<PricingResolver>,
    pub signing_key: Arc<[u8]>,
    pub provisioning_api_key: Arc<str>,
    pub clock: Arc<dyn Clock>,
    pub default_shard_count: u32,
    pub retention_days: i64,
}

impl AppState {
    pub async fn new(config: &Config, pricebook: model_meter_domain::Pricebook) -> anyhow::Result<Self> {
        let store = Store::connect(&config.store_url, config.store_auth_token.clone()).await?;
        Ok(Self {
            store: Arc::new(store),
            pricing: Arc::new(PricingResolver::new(pricebook)),
            signing_key: Arc::from(config.signing_secret.clone().into_boxed_slice()),
            provisioning_api_key: Arc::from(config.provisioning_api_key.as_str()),
            clock: Arc::new(SystemClock),
            default_shard_count: config.default_shard_count,
            retention_days: config.retention_days,
        })
    }
}
