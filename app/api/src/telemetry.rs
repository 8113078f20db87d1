//! Structured logging init (spec.md §4.O), grounded on the teacher's
//! `heimdall::init_tracing`: `EnvFilter`-driven, compact in debug builds,
//! flattened JSON in release, with a panic hook that logs before the
//! default panic behavior runs.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(environment: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg!(debug_assertions) {
        fmt().with_env_filter(filter).with_target(true).compact().init();
    } else {
        fmt().with_env_filter(filter).json().flatten_event(true).init();
    }

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panicked");
    }));

    tracing::info!(environment, "tracing initialized");
}
