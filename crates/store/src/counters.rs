//! Idempotent sharded counters (spec.md §4.F) — the hardest component.
//!
//! The DynamoDB-shaped "conditional write with a not-contains guard on a
//! set attribute" is reproduced here as a single SQL transaction: the
//! request-id is inserted into a junction table whose primary key is
//! `(scope_key, day_key, label, shard_index, request_id)`; the insert
//! either succeeds (first time we see this id in this shard) or fails on
//! the uniqueness constraint (a retry). Only a successful insert triggers
//! the numeric increment, so the increment applies exactly once.

use crate::client::Store;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use model_meter_domain::DailyTotal;

impl Store {
    /// Applies one usage submission to its shard. Returns `true` if this
    /// was the first time `request_id` was recorded in the shard (a new
    /// contribution), `false` if it was already present (idempotent no-op).
    pub async fn apply_usage_shard(
        &self,
        scope_key: &str,
        day_key: &str,
        label: &str,
        shard_index: u32,
        request_id: &str,
        cost_micros: u64,
        input_tokens: u64,
        output_tokens: u64,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().await?;

        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO usage_shard_requests
                    (scope_key, day_key, label, shard_index, request_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![scope_key, day_key, label, shard_index, request_id],
            )
            .await?;

        if inserted == 0 {
            // Guard failed: request_id already contained. Idempotent no-op.
            tx.commit().await?;
            return Ok(false);
        }

        let expires_at = now + chrono::Duration::days(retention_days);

        tx.execute(
            "INSERT INTO usage_shards
                (scope_key, day_key, label, shard_index, cost_micros, input_tokens, output_tokens, request_count, updated_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)
             ON CONFLICT (scope_key, day_key, label, shard_index) DO UPDATE SET
                cost_micros = cost_micros + excluded.cost_micros,
                input_tokens = input_tokens + excluded.input_tokens,
                output_tokens = output_tokens + excluded.output_tokens,
                request_count = request_count + 1,
                updated_at = excluded.updated_at",
            libsql::params![
                scope_key,
                day_key,
                label,
                shard_index,
                cost_micros as i64,
                input_tokens as i64,
                output_tokens as i64,
                now.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Reads all `shard_count` shard cells for one label and sums them
    /// componentwise. Missing or expired shards count as zero.
    pub async fn daily_total(
        &self,
        scope_key: &str,
        day_key: &str,
        label: &str,
        shard_count: u32,
        now: DateTime<Utc>,
    ) -> Result<DailyTotal, StoreError> {
        let totals = self
            .daily_totals_batch(scope_key, day_key, &[label.to_string()], shard_count, now)
            .await?;
        Ok(totals.get(label).copied().unwrap_or_default())
    }

    /// Batch-reads `labels.len() * shard_count` shard keys in one query and
    /// groups the result by label — the form the selection engine always uses.
    pub async fn daily_totals_batch(
        &self,
        scope_key: &str,
        day_key: &str,
        labels: &[String],
        shard_count: u32,
        now: DateTime<Utc>,
    ) -> Result<std::collections::HashMap<String, DailyTotal>, StoreError> {
        let mut out: std::collections::HashMap<String, DailyTotal> =
            labels.iter().map(|l| (l.clone(), DailyTotal::default())).collect();

        if labels.is_empty() {
            return Ok(out);
        }

        let conn = self.connection()?;
        let placeholders: Vec<String> = (1..=labels.len()).map(|i| format!("?{}", i + 2)).collect();
        let query = format!(
            "SELECT label, cost_micros, input_tokens, output_tokens, request_count
             FROM usage_shards
             WHERE scope_key = ?1 AND day_key = ?2 AND expires_at > ?{next}
               AND label IN ({placeholders})",
            next = labels.len() + 3,
            placeholders = placeholders.join(", "),
        );

        let mut params: Vec<libsql::Value> = vec![scope_key.into(), day_key.into()];
        for label in labels {
            params.push(label.clone().into());
        }
        params.push(now.to_rfc3339().into());

        let _ = shard_count; // shard_count bounds writes; reads simply scan all rows for the label.
        let mut rows = conn.query(&query, libsql::params_from_iter(params)).await?;
        while let Some(row) = rows.next().await? {
            let label: String = row.get(0)?;
            let cost_micros: i64 = row.get(1)?;
            let input_tokens: i64 = row.get(2)?;
            let output_tokens: i64 = row.get(3)?;
            let request_count: i64 = row.get(4)?;
            let entry = out.entry(label).or_insert_with(DailyTotal::default);
            entry.cost_micros += cost_micros as u64;
            entry.input_tokens += input_tokens as u64;
            entry.output_tokens += output_tokens as u64;
            entry.requests += request_count as u64;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn fixture_store() -> Store {
        Store::connect(":memory:", None).await.unwrap()
    }

    #[tokio::test]
    async fn duplicate_request_id_applies_exactly_once() {
        let store = fixture_store().await;
        let now = Utc::now();

        let first = store
            .apply_usage_shard("ORG#1", "DAY#20260726", "premium", 0, "req-1", 100, 10, 5, now, 32)
            .await
            .unwrap();
        assert!(first);

        let second = store
            .apply_usage_shard("ORG#1", "DAY#20260726", "premium", 0, "req-1", 100, 10, 5, now, 32)
            .await
            .unwrap();
        assert!(!second);

        let total = store
            .daily_total("ORG#1", "DAY#20260726", "premium", 8, now)
            .await
            .unwrap();
        assert_eq!(total.cost_micros, 100);
        assert_eq!(total.requests, 1);
    }

    #[tokio::test]
    async fn batch_read_groups_by_label() {
        let store = fixture_store().await;
        let now = Utc::now();
        store
            .apply_usage_shard("ORG#1", "DAY#20260726", "premium", 0, "req-1", 100, 10, 5, now, 32)
            .await
            .unwrap();
        store
            .apply_usage_shard("ORG#1", "DAY#20260726", "standard", 1, "req-2", 50, 5, 2, now, 32)
            .await
            .unwrap();

        let totals = store
            .daily_totals_batch(
                "ORG#1",
                "DAY#20260726",
                &["premium".to_string(), "standard".to_string(), "economy".to_string()],
                8,
                now,
            )
            .await
            .unwrap();

        assert_eq!(totals["premium"].cost_micros, 100);
        assert_eq!(totals["standard"].cost_micros, 50);
        assert_eq!(totals["economy"].cost_micros, 0);
    }
}
