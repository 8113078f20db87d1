//! Revocation records for issued JWTs (spec.md §3 "Revoked-token record",
//! §4.C). `expires_at` mirrors the token's own `exp` so the list is
//! self-pruning via `sweep_expired`, matching the store-level TTL the spec
//! assumes a document store would provide natively.

use crate::client::Store;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};

impl Store {
    pub async fn revoke_token(
        &self,
        jti: &str,
        token_kind: &str,
        subject_client_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO revoked_tokens (jti, token_kind, subject_client_id, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            libsql::params![jti, token_kind, subject_client_id, expires_at.to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query("SELECT 1 FROM revoked_tokens WHERE jti = ?1", libsql::params![jti])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Returns the subject client-id for a revoked token, for the
    /// "a caller may revoke only tokens whose `sub` equals its own
    /// authenticated `sub`" rule — checked before revoking, not after.
    pub async fn sweep_expired_revocations(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let conn = self.connection()?;
        let removed = conn
            .execute(
                "DELETE FROM revoked_tokens WHERE expires_at <= ?1",
                libsql::params![now.to_rfc3339()],
            )
            .await?;
        Ok(removed)
    }
}
