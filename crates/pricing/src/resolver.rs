//! Three-tier pricing resolution (spec.md §4.D): process memo → store
//! cache → static pricebook, leaves-first, with write-back to every
//! earlier tier on a hit.

use crate::errors::PricingError;
use model_meter_domain::Pricebook;
use model_meter_store::{CachedPrice, Store};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const MEMO_TTL: Duration = Duration::from_secs(5 * 60);
const STORE_CACHE_TTL: chrono::Duration = chrono::Duration::minutes(30);

#[derive(Debug, Clone, Copy)]
pub struct ResolvedPrice {
    pub input_price_usd_micros_per_1m: u64,
    pub output_price_usd_micros_per_1m: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    model_id: String,
    date: String,
    region: Option<String>,
}

struct MemoEntry {
    price: ResolvedPrice,
    expires_at: Instant,
}

/// The process-local memoization tier plus handles down to the store and
/// static pricebook. One instance lives for the process lifetime, held in
/// `Arc` by `AppState` (spec.md §5's one permitted piece of global mutable
/// state besides the signing key and the clock).
pub struct PricingResolver {
    pricebook: Pricebook,
    memo: RwLock<HashMap<MemoKey, MemoEntry>>,
}

impl PricingResolver {
    pub fn new(pricebook: Pricebook) -> Self {
        Self { pricebook, memo: RwLock::new(HashMap::new()) }
    }

    /// Resolves the price for `model_id` priced as of `date` (an
    /// org-local `YYYYMMDD` string — prices may vary by calendar day in
    /// principle, though the static pricebook does not today) and
    /// optional `region`. Absence at every tier is a hard configuration
    /// error, never surfaced to the caller as their mistake.
    pub async fn resolve(
        &self,
        store: &Store,
        model_id: &str,
        date: &str,
        region: Option<&str>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<ResolvedPrice, PricingError> {
        let key = MemoKey { model_id: model_id.to_string(), date: date.to_string(), region: region.map(str::to_string) };

        if let Some(entry) = self.memo.read().get(&key) {
            if entry.expires_at > Instant::now() {
                return Ok(entry.price);
            }
        }

        if let Some(cached) = store.get_cached_price(model_id, date, region, now).await? {
            let price = ResolvedPrice {
                input_price_usd_micros_per_1m: cached.input_price_usd_micros_per_1m,
                output_price_usd_micros_per_1m: cached.output_price_usd_micros_per_1m,
            };
            self.memoize(key, price);
            return Ok(price);
        }

        if let Some(entry) = self.pricebook.get_by_identifier(model_id) {
            let price = ResolvedPrice {
                input_price_usd_micros_per_1m: entry.input_price_usd_micros_per_1m,
                output_price_usd_micros_per_1m: entry.output_price_usd_micros_per_1m,
            };
            store
                .put_cached_price(
                    model_id,
                    date,
                    region,
                    CachedPrice {
                        input_price_usd_micros_per_1m: price.input_price_usd_micros_per_1m,
                        output_price_usd_micros_per_1m: price.output_price_usd_micros_per_1m,
                    },
                    now + STORE_CACHE_TTL,
                )
                .await?;
            self.memoize(key, price);
            return Ok(price);
        }

        Err(PricingError::PricingMissing { model_id: model_id.to_string(), date: date.to_string() })
    }

    fn memoize(&self, key: MemoKey, price: ResolvedPrice) {
        self.memo.write().insert(key, MemoEntry { price, expires_at: Instant::now() + MEMO_TTL });
    }

    pub fn pricebook(&self) -> &Pricebook {
        &self.pricebook
    }
}
