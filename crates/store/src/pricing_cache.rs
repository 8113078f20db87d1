//! Store tier of the three-tier pricing resolver (spec.md §4.D, tier 2).

use crate::client::Store;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy)]
pub struct CachedPrice {
    pub input_price_usd_micros_per_1m: u64,
    pub output_price_usd_micros_per_1m: u64,
}

impl Store {
    pub async fn get_cached_price(
        &self,
        model_id: &str,
        date: &str,
        region: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedPrice>, StoreError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT input_price_usd_micros_per_1m, output_price_usd_micros_per_1m
                 FROM price_cache
                 WHERE model_id = ?1 AND date = ?2 AND region = ?3 AND expires_at > ?4",
                libsql::params![model_id, date, region.unwrap_or(""), now.to_rfc3339()],
            )
            .await?;
        if let Some(row) = rows.next().await? {
            let input: i64 = row.get(0)?;
            let output: i64 = row.get(1)?;
            Ok(Some(CachedPrice {
                input_price_usd_micros_per_1m: input as u64,
                output_price_usd_micros_per_1m: output as u64,
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn put_cached_price(
        &self,
        model_id: &str,
        date: &str,
        region: Option<&str>,
        price: CachedPrice,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO price_cache
                (model_id, date, region, input_price_usd_micros_per_1m, output_price_usd_micros_per_1m, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![
                model_id,
                date,
                region.unwrap_or(""),
                price.input_price_usd_micros_per_1m as i64,
                price.output_price_usd_micros_per_1m as i64,
                expires_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }
}
