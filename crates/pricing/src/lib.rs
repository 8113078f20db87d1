//! Label resolution and three-tier pricing (spec.md §4.D, §4.E).

mod errors;
mod label;
mod resolver;

pub use errors::PricingError;
pub use label::{register_profile, resolve_label};
pub use resolver::{PricingResolver, ResolvedPrice};

use chrono::{DateTime, Utc};
use model_meter_domain::{CostBreakdown, LabelResolution};
use model_meter_store::Store;
use uuid::Uuid;

/// Resolves `label` to a model identifier and prices it, in one call —
/// the composition the metering core actually needs on the write path
/// (spec.md's `J → E → D → F(write)` data flow).
pub async fn resolve_and_price(
    store: &Store,
    resolver: &PricingResolver,
    org_id: Uuid,
    app_id: &str,
    label: &str,
    calling_region: Option<&str>,
    input_tokens: u64,
    output_tokens: u64,
    price_date: &str,
    now: DateTime<Utc>,
) -> Result<(LabelResolution, CostBreakdown), PricingError> {
    let resolution = resolve_label(store, resolver.pricebook(), org_id, app_id, label, calling_region).await?;
    let price = resolver
        .resolve(store, resolution.identifier(), price_date, resolution.pricing_region(), now)
        .await?;
    let cost = CostBreakdown::derive(
        input_tokens,
        output_tokens,
        price.input_price_usd_micros_per_1m,
        price.output_price_usd_micros_per_1m,
    );
    Ok((resolution, cost))
}
