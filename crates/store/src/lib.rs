//! Typed libSQL-backed persistence adapter.
//!
//! This is the one crate in the workspace that knows it is talking to
//! SQL; every other crate only ever sees `model_meter_domain` types and
//! the methods on [`Store`].

mod client;
mod config;
mod counters;
mod errors;
mod pricing_cache;
mod reaper;
mod schema;
mod sticky;
mod tokens;

pub use client::Store;
pub use errors::StoreError;
pub use pricing_cache::CachedPrice;
pub use reaper::spawn_reaper;
