//! Environment-sourced configuration (spec.md §6.3).

use std::env;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(String),
    #[error("invalid value for environment variable {name}: {value}")]
    InvalidVar { name: String, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub region: String,
    pub environment: String,
    pub store_url: String,
    pub store_auth_token: Option<String>,
    pub signing_secret: Vec<u8>,
    pub provisioning_api_key: String,
    pub pricebook_path: PathBuf,
    pub default_shard_count: u32,
    pub retention_days: i64,
    pub reaper_interval_secs: u64,
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from the process environment, following the
    /// teacher's `.env`-then-`std::env::var` idiom, collapsed into one
    /// fallible constructor instead of scattered inline reads.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = optional("MODEL_METER_BIND_ADDR", "0.0.0.0:8080");
        let region = optional("MODEL_METER_REGION", "us-east-1");
        let environment = optional("MODEL_METER_ENVIRONMENT", "development");
        let store_url = optional("MODEL_METER_STORE_URL", "model_meter.db");
        let store_auth_token = env::var("MODEL_METER_STORE_AUTH_TOKEN").ok();
        let signing_secret = required("MODEL_METER_SIGNING_SECRET")?.into_bytes();
        let provisioning_api_key = required("MODEL_METER_PROVISIONING_API_KEY")?;
        let pricebook_path = PathBuf::from(optional("MODEL_METER_PRICEBOOK_PATH", "pricebook.json"));

        let default_shard_count = optional("MODEL_METER_DEFAULT_SHARD_COUNT", "8")
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name: "MODEL_METER_DEFAULT_SHARD_COUNT".into(), value: "".into() })?;
        let retention_days = optional("MODEL_METER_RETENTION_DAYS", "32")
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name: "MODEL_METER_RETENTION_DAYS".into(), value: "".into() })?;
        let reaper_interval_secs = optional("MODEL_METER_REAPER_INTERVAL_SECS", "300")
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name: "MODEL_METER_REAPER_INTERVAL_SECS".into(), value: "".into() })?;

        Ok(Self {
            bind_addr,
            region,
            environment,
            store_url,
            store_auth_token,
            signing_secret,
            provisioning_api_key,
            pricebook_path,
            default_shard_count,
            retention_days,
            reaper_interval_secs,
        })
    }
}
