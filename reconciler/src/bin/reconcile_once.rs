//! Runs a single reconciliation cycle and exits, e.g. to backfill right after
//! an outage instead of waiting for the next slot.
//!
//! `--skip-catchup` goes straight to the reads.

use anyhow::{bail, Result};
use energy_reconciler::{
    config::{AppConfig, Secrets},
    observability,
    reconcile::Reconciler,
    sinks::Store,
};
use glow_client::GlowApi;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    observability::init_tracing();

    let mut skip_catchup = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--skip-catchup" => skip_catchup = true,
            other => bail!("usage: reconcile_once [--skip-catchup] (unexpected argument {other:?})"),
        }
    }

    // Load configuration (can point RECONCILER_CONFIG to a one-off file).
    let cfg = AppConfig::load()?;
    let secrets = Secrets::from_env(cfg.store.kind)?;

    let glow = GlowApi::authenticate(cfg.glow.endpoint(), &secrets.glow.username, &secrets.glow.password).await?;
    let store = Store::connect(&secrets.store).await?;
    let reconciler = Reconciler::new(glow, store, cfg.resources, cfg.schedule.cadence());

    let written = if skip_catchup {
        reconciler.reconcile().await?
    } else {
        reconciler.run_cycle().await?
    };
    tracing::info!(points = written, "reconciliation finished");

    Ok(())
}
