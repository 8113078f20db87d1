//! Process entry point: loads configuration, connects the store, spawns
//! the retention reaper, and serves the HTTP surface.

use model_meter_api::{routes::build_router, telemetry::init_tracing, AppState, Config};
use model_meter_domain::{Pricebook, StaticModelEntry};
use model_meter_store::spawn_reaper;
use std::time::Duration;
use tracing::{error, info};

fn load_pricebook(path: &std::path::Path) -> anyhow::Result<Pricebook> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<StaticModelEntry> = serde_json::from_str(&raw)?;
    Ok(Pricebook::from_entries(entries))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    init_tracing(&config.environment);

    // The batch-usage endpoint and the pricing memo can both produce deep
    // recursive drops on large collections; the teacher's services carry
    // the same oversized stack for the same reason.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async move {
        let pricebook = load_pricebook(&config.pricebook_path)?;
        info!(labels = pricebook.labels().count(), "pricebook loaded");

        let state = AppState::new(&config, pricebook).await?;

        let reaper_store = (*state.store).clone();
        spawn_reaper(reaper_store, Duration::from_secs(config.reaper_interval_secs));

        let router = build_router(state);
        let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
        info!(addr = %config.bind_addr, "model-meter-api listening");

        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "server terminated");
        }

        Ok::<(), anyhow::Error>(())
    })
}
