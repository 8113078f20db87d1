//! Background retention sweep. Grounded on the teacher's `reaper.rs`
//! daemon: a single interval-driven task that purges rows past their
//! store-level TTL, since SQLite has no native row-expiry the way a
//! managed document store would.

use crate::client::Store;
use crate::errors::StoreError;
use chrono::Utc;

impl Store {
    /// Deletes counter shards and shard-request junction rows whose
    /// retention window (spec.md §4.F "Retention") has elapsed.
    pub async fn sweep_expired_shards(&self) -> Result<u64, StoreError> {
        let conn = self.connection()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "DELETE FROM usage_shard_requests WHERE (scope_key, day_key, label, shard_index) IN
                (SELECT scope_key, day_key, label, shard_index FROM usage_shards WHERE expires_at <= ?1)",
            libsql::params![now.clone()],
        )
        .await?;
        let removed = conn
            .execute("DELETE FROM usage_shards WHERE expires_at <= ?1", libsql::params![now])
            .await?;
        Ok(removed)
    }

    /// Runs one full retention sweep: expired counter shards, expired
    /// revocation records, expired price-cache rows.
    pub async fn run_retention_sweep(&self) -> Result<(), StoreError> {
        let now = Utc::now();
        let shards_removed = self.sweep_expired_shards().await?;
        let tokens_removed = self.sweep_expired_revocations(now).await?;
        let conn = self.connection()?;
        let prices_removed = conn
            .execute(
                "DELETE FROM price_cache WHERE expires_at <= ?1",
                libsql::params![now.to_rfc3339()],
            )
            .await?;
        tracing::debug!(
            shards_removed,
            tokens_removed,
            prices_removed,
            "retention sweep complete"
        );
        Ok(())
    }
}

/// Spawns the periodic retention daemon on the current Tokio runtime.
/// Mirrors the teacher's `spawn_reaper`: one `tokio::spawn`, one
/// `tokio::time::interval`, no further synchronization required because
/// every sweep statement is itself atomic.
pub fn spawn_reaper(store: Store, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = store.run_retention_sweep().await {
                tracing::warn!(error = %err, "retention sweep failed");
            }
        }
    })
}
