//! Sticky-fallback state transitions (spec.md §4.G). Both writes below are
//! conditional so that concurrent handlers racing to promote or advance the
//! state never move the stored index backwards (P2 / invariant "sticky
//! never retreats within a day").

use crate::client::Store;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use model_meter_domain::{StickyReason, StickyState};

fn reason_str(reason: StickyReason) -> &'static str {
    match reason {
        StickyReason::Normal => "NORMAL",
        StickyReason::QuotaExceeded => "QUOTA_EXCEEDED",
    }
}

fn parse_reason(s: &str) -> StickyReason {
    match s {
        "QUOTA_EXCEEDED" => StickyReason::QuotaExceeded,
        _ => StickyReason::Normal,
    }
}

impl Store {
    pub async fn get_sticky(&self, scope_key: &str, day_key: &str) -> Result<Option<StickyState>, StoreError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT active_index, active_label, reason, since, displaced_label
                 FROM sticky_state WHERE scope_key = ?1 AND day_key = ?2",
                libsql::params![scope_key, day_key],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            let active_index: i64 = row.get(0)?;
            let active_label: String = row.get(1)?;
            let reason: String = row.get(2)?;
            let since: String = row.get(3)?;
            let displaced_label: Option<String> = row.get(4)?;
            let since = DateTime::parse_from_rfc3339(&since)
                .map_err(|e| StoreError::Decode(e.to_string()))?
                .with_timezone(&Utc);
            Ok(Some(StickyState {
                active_index: active_index as usize,
                active_label,
                reason: parse_reason(&reason),
                since,
                displaced_label,
            }))
        } else {
            Ok(None)
        }
    }

    /// `null -> sticky(index)` transition. Succeeds only if no sticky state
    /// exists yet for this (scope, day). Returns `true` on success.
    pub async fn try_promote_sticky(
        &self,
        scope_key: &str,
        day_key: &str,
        index: usize,
        label: &str,
        reason: StickyReason,
        since: DateTime<Utc>,
        displaced_label: Option<&str>,
    ) -> Result<bool, StoreError> {
        let conn = self.connection()?;
        let affected = conn
            .execute(
                "INSERT OR IGNORE INTO sticky_state
                    (scope_key, day_key, active_index, active_label, reason, since, displaced_label)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    scope_key,
                    day_key,
                    index as i64,
                    label,
                    reason_str(reason),
                    since.to_rfc3339(),
                    displaced_label,
                ],
            )
            .await?;
        Ok(affected > 0)
    }

    /// `sticky(i) -> sticky(j), j > i` transition. Succeeds only if the
    /// stored index is still strictly less than `index`. Returns `true` on
    /// success.
    pub async fn try_advance_sticky(
        &self,
        scope_key: &str,
        day_key: &str,
        index: usize,
        label: &str,
        reason: StickyReason,
        since: DateTime<Utc>,
        displaced_label: Option<&str>,
    ) -> Result<bool, StoreError> {
        let conn = self.connection()?;
        let affected = conn
            .execute(
                "UPDATE sticky_state
                 SET active_index = ?3, active_label = ?4, reason = ?5, since = ?6, displaced_label = ?7
                 WHERE scope_key = ?1 AND day_key = ?2 AND active_index < ?3",
                libsql::params![
                    scope_key,
                    day_key,
                    index as i64,
                    label,
                    reason_str(reason),
                    since.to_rfc3339(),
                    displaced_label,
                ],
            )
            .await?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn promote_then_advance_is_monotone() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let now = Utc::now();

        assert!(store
            .try_promote_sticky("ORG#1", "DAY#1", 1, "standard", StickyReason::QuotaExceeded, now, None)
            .await
            .unwrap());

        // A second promote attempt must fail: state already exists.
        assert!(!store
            .try_promote_sticky("ORG#1", "DAY#1", 1, "standard", StickyReason::QuotaExceeded, now, None)
            .await
            .unwrap());

        // Advancing to a lower or equal index must fail.
        assert!(!store
            .try_advance_sticky("ORG#1", "DAY#1", 1, "standard", StickyReason::QuotaExceeded, now, None)
            .await
            .unwrap());

        // Advancing to a strictly higher index succeeds.
        assert!(store
            .try_advance_sticky(
                "ORG#1",
                "DAY#1",
                2,
                "economy",
                StickyReason::QuotaExceeded,
                now,
                Some("standard")
            )
            .await
            .unwrap());

        let state = store.get_sticky("ORG#1", "DAY#1").await.unwrap().unwrap();
        assert_eq!(state.active_index, 2);
        assert_eq!(state.active_label, "economy");
    }
}
