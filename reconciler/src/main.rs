use anyhow::Result;
use energy_reconciler::{
    config::{AppConfig, Secrets},
    metrics_server,
    observability,
    reconcile::{schedule::jittered, Reconciler},
    sinks::Store,
};
use glow_client::GlowApi;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    observability::init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "reconciler stopped");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let cfg = AppConfig::load()?;
    let secrets = Secrets::from_env(cfg.store.kind)?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let delay = jittered(cfg.schedule.startup_delay(), cfg.schedule.jitter);
    tracing::info!(delay_secs = delay.as_secs(), "delaying start");
    tokio::time::sleep(delay).await;

    let glow = GlowApi::authenticate(cfg.glow.endpoint(), &secrets.glow.username, &secrets.glow.password).await?;
    let store = Store::connect(&secrets.store).await?;
    tracing::info!(resources = cfg.resources.len(), store = ?cfg.store.kind, "starting reconciliation");

    let reconciler = Reconciler::new(glow, store, cfg.resources, cfg.schedule.cadence());
    match reconciler.run_forever().await? {}
}
