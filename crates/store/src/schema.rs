//! The five logical tables of spec.md §6.2, folded behind one physical
//! libSQL database, plus the price cache.

use crate::errors::StoreError;
use libsql::Connection;

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS organizations (
        org_id TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        timezone TEXT NOT NULL,
        quota_scope TEXT NOT NULL,
        model_ordering TEXT NOT NULL,
        quotas TEXT NOT NULL,
        shard_count INTEGER NOT NULL,
        client_id TEXT NOT NULL,
        current_hash TEXT NOT NULL,
        previous_hash TEXT,
        grace_expiry TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS applications (
        org_id TEXT NOT NULL,
        app_id TEXT NOT NULL,
        display_name TEXT NOT NULL,
        overrides TEXT NOT NULL,
        client_id TEXT NOT NULL,
        current_hash TEXT NOT NULL,
        previous_hash TEXT,
        grace_expiry TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (org_id, app_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS inference_profiles (
        org_id TEXT NOT NULL,
        app_id TEXT NOT NULL,
        label TEXT NOT NULL,
        arn TEXT NOT NULL,
        region_map TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (org_id, app_id, label)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS usage_shards (
        scope_key TEXT NOT NULL,
        day_key TEXT NOT NULL,
        label TEXT NOT NULL,
        shard_index INTEGER NOT NULL,
        cost_micros INTEGER NOT NULL DEFAULT 0,
        input_tokens INTEGER NOT NULL DEFAULT 0,
        output_tokens INTEGER NOT NULL DEFAULT 0,
        request_count INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        PRIMARY KEY (scope_key, day_key, label, shard_index)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS usage_shard_requests (
        scope_key TEXT NOT NULL,
        day_key TEXT NOT NULL,
        label TEXT NOT NULL,
        shard_index INTEGER NOT NULL,
        request_id TEXT NOT NULL,
        PRIMARY KEY (scope_key, day_key, label, shard_index, request_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS sticky_state (
        scope_key TEXT NOT NULL,
        day_key TEXT NOT NULL,
        active_index INTEGER NOT NULL,
        active_label TEXT NOT NULL,
        reason TEXT NOT NULL,
        since TEXT NOT NULL,
        displaced_label TEXT,
        PRIMARY KEY (scope_key, day_key)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS revoked_tokens (
        jti TEXT PRIMARY KEY,
        token_kind TEXT NOT NULL,
        subject_client_id TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS price_cache (
        model_id TEXT NOT NULL,
        date TEXT NOT NULL,
        region TEXT NOT NULL DEFAULT '',
        input_price_usd_micros_per_1m INTEGER NOT NULL,
        output_price_usd_micros_per_1m INTEGER NOT NULL,
        expires_at TEXT NOT NULL,
        PRIMARY KEY (model_id, date, region)
    )"#,
];

pub async fn apply_schema(conn: &Connection) -> Result<(), StoreError> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, ())
            .await
            .map_err(|e| StoreError::Schema(format!("{e} (statement: {statement})")))?;
    }
    Ok(())
}
