//! Config table: organizations, applications, inference profiles (spec.md
//! §3, §6.2). Overrides/ladders/quotas are stored as JSON text columns —
//! the domain layer above never sees an untyped map, only the closed
//! `Overrides`/`Organization`/`Application` structs it was decoded into.

use crate::client::Store;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use model_meter_domain::{Application, CredentialRecord, InferenceProfile, Organization, Overrides, QuotaScope};
use std::collections::HashMap;
use uuid::Uuid;

fn scope_str(scope: QuotaScope) -> &'static str {
    match scope {
        QuotaScope::Org => "ORG",
        QuotaScope::App => "APP",
    }
}

fn parse_scope(s: &str) -> QuotaScope {
    match s {
        "APP" => QuotaScope::App,
        _ => QuotaScope::Org,
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(e.to_string()))
}

impl Store {
    pub async fn upsert_organization(&self, org: &Organization) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO organizations
                (org_id, display_name, timezone, quota_scope, model_ordering, quotas, shard_count,
                 client_id, current_hash, previous_hash, grace_expiry, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT (org_id) DO UPDATE SET
                display_name = excluded.display_name,
                timezone = excluded.timezone,
                quota_scope = excluded.quota_scope,
                model_ordering = excluded.model_ordering,
                quotas = excluded.quotas,
                shard_count = excluded.shard_count,
                updated_at = excluded.updated_at",
            libsql::params![
                org.org_id.to_string(),
                org.display_name.clone(),
                org.timezone.clone(),
                scope_str(org.quota_scope),
                serde_json::to_string(&org.model_ordering).map_err(|e| StoreError::Decode(e.to_string()))?,
                serde_json::to_string(&org.quotas).map_err(|e| StoreError::Decode(e.to_string()))?,
                org.shard_count as i64,
                org.credentials.client_id.clone(),
                org.credentials.current_hash.clone(),
                org.credentials.previous_hash.clone(),
                org.credentials.grace_expiry.map(|t| t.to_rfc3339()),
                org.created_at.to_rfc3339(),
                org.updated_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn get_organization(&self, org_id: Uuid) -> Result<Option<Organization>, StoreError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT display_name, timezone, quota_scope, model_ordering, quotas, shard_count,
                        client_id, current_hash, previous_hash, grace_expiry, created_at, updated_at
                 FROM organizations WHERE org_id = ?1",
                libsql::params![org_id.to_string()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let display_name: String = row.get(0)?;
        let timezone: String = row.get(1)?;
        let quota_scope: String = row.get(2)?;
        let model_ordering: String = row.get(3)?;
        let quotas: String = row.get(4)?;
        let shard_count: i64 = row.get(5)?;
        let client_id: String = row.get(6)?;
        let current_hash: String = row.get(7)?;
        let previous_hash: Option<String> = row.get(8)?;
        let grace_expiry: Option<String> = row.get(9)?;
        let created_at: String = row.get(10)?;
        let updated_at: String = row.get(11)?;

        Ok(Some(Organization {
            org_id,
            display_name,
            timezone,
            quota_scope: parse_scope(&quota_scope),
            model_ordering: serde_json::from_str(&model_ordering).map_err(|e| StoreError::Decode(e.to_string()))?,
            quotas: serde_json::from_str(&quotas).map_err(|e| StoreError::Decode(e.to_string()))?,
            shard_count: shard_count as u32,
            credentials: CredentialRecord {
                client_id,
                current_hash,
                previous_hash,
                grace_expiry: grace_expiry.map(|s| parse_rfc3339(&s)).transpose()?,
                created_at: parse_rfc3339(&created_at)?,
            },
            created_at: parse_rfc3339(&created_at)?,
            updated_at: parse_rfc3339(&updated_at)?,
        }))
    }

    pub async fn upsert_application(&self, app: &Application) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO applications
                (org_id, app_id, display_name, overrides, client_id, current_hash, previous_hash,
                 grace_expiry, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (org_id, app_id) DO UPDATE SET
                display_name = excluded.display_name,
                overrides = excluded.overrides,
                updated_at = excluded.updated_at",
            libsql::params![
                app.org_id.to_string(),
                app.app_id.clone(),
                app.display_name.clone(),
                serde_json::to_string(&app.overrides).map_err(|e| StoreError::Decode(e.to_string()))?,
                app.credentials.client_id.clone(),
                app.credentials.current_hash.clone(),
                app.credentials.previous_hash.clone(),
                app.credentials.grace_expiry.map(|t| t.to_rfc3339()),
                app.created_at.to_rfc3339(),
                app.updated_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn get_application(&self, org_id: Uuid, app_id: &str) -> Result<Option<Application>, StoreError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT display_name, overrides, client_id, current_hash, previous_hash, grace_expiry,
                        created_at, updated_at
                 FROM applications WHERE org_id = ?1 AND app_id = ?2",
                libsql::params![org_id.to_string(), app_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let display_name: String = row.get(0)?;
        let overrides: String = row.get(1)?;
        let client_id: String = row.get(2)?;
        let current_hash: String = row.get(3)?;
        let previous_hash: Option<String> = row.get(4)?;
        let grace_expiry: Option<String> = row.get(5)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;

        Ok(Some(Application {
            org_id,
            app_id: app_id.to_string(),
            display_name,
            overrides: serde_json::from_str::<Overrides>(&overrides).map_err(|e| StoreError::Decode(e.to_string()))?,
            credentials: CredentialRecord {
                client_id,
                current_hash,
                previous_hash,
                grace_expiry: grace_expiry.map(|s| parse_rfc3339(&s)).transpose()?,
                created_at: parse_rfc3339(&created_at)?,
            },
            created_at: parse_rfc3339(&created_at)?,
            updated_at: parse_rfc3339(&updated_at)?,
        }))
    }

    pub async fn register_profile(&self, profile: &InferenceProfile) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO inference_profiles (org_id, app_id, label, arn, region_map, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (org_id, app_id, label) DO UPDATE SET
                arn = excluded.arn,
                region_map = excluded.region_map",
            libsql::params![
                profile.org_id.to_string(),
                profile.app_id.clone(),
                profile.label.clone(),
                profile.arn.clone(),
                serde_json::to_string(&profile.region_map).map_err(|e| StoreError::Decode(e.to_string()))?,
                profile.created_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn get_profile(
        &self,
        org_id: Uuid,
        app_id: &str,
        label: &str,
    ) -> Result<Option<InferenceProfile>, StoreError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT arn, region_map, created_at FROM inference_profiles
                 WHERE org_id = ?1 AND app_id = ?2 AND label = ?3",
                libsql::params![org_id.to_string(), app_id, label],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let arn: String = row.get(0)?;
        let region_map: String = row.get(1)?;
        let created_at: String = row.get(2)?;

        Ok(Some(InferenceProfile {
            org_id,
            app_id: app_id.to_string(),
            label: label.to_string(),
            arn,
            region_map: serde_json::from_str::<HashMap<String, String>>(&region_map)
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            created_at: parse_rfc3339(&created_at)?,
        }))
    }

    pub async fn list_profiles(&self, org_id: Uuid, app_id: &str) -> Result<Vec<InferenceProfile>, StoreError> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT label, arn, region_map, created_at FROM inference_profiles
                 WHERE org_id = ?1 AND app_id = ?2",
                libsql::params![org_id.to_string(), app_id],
            )
            .await?;

        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await? {
            let label: String = row.get(0)?;
            let arn: String = row.get(1)?;
            let region_map: String = row.get(2)?;
            let created_at: String = row.get(3)?;
            profiles.push(InferenceProfile {
                org_id,
                app_id: app_id.to_string(),
                label,
                arn,
                region_map: serde_json::from_str::<HashMap<String, String>>(&region_map)
                    .map_err(|e| StoreError::Decode(e.to_string()))?,
                created_at: parse_rfc3339(&created_at)?,
            });
        }
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_meter_domain::CredentialRecord;

    #[tokio::test]
    async fn organization_roundtrips() {
        let store = Store::connect(":memory:", None).await.unwrap();
        let now = Utc::now();
        let org = Organization {
            org_id: Uuid::new_v4(),
            display_name: "Acme".into(),
            timezone: "America/New_York".into(),
            quota_scope: QuotaScope::Org,
            model_ordering: vec!["premium".into()],
            quotas: HashMap::from([("premium".into(), 1_000)]),
            shard_count: 8,
            credentials: CredentialRecord::new("org-x".into(), "hash".into(), now),
            created_at: now,
            updated_at: now,
        };
        store.upsert_organization(&org).await.unwrap();
        let fetched = store.get_organization(org.org_id).await.unwrap().unwrap();
        assert_eq!(fetched.display_name, "Acme");
        assert_eq!(fetched.model_ordering, vec!["premium".to_string()]);
    }
}
