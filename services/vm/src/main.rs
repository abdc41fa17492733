//! Tickmesh launcher.
//!
//! `tickmesh --config sim.toml` runs the whole configured fleet in this
//! process; `tickmesh --config sim.toml --actor 2` runs one actor of the
//! membership, for spreading a fleet across processes or hosts. The run
//! ends at the configured deadline or on Ctrl-C, whichever comes first.

use anyhow::Result;
use clap::Parser;
use config::SimulationConfig;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use types::ActorId;

#[derive(Debug, Parser)]
#[command(name = "tickmesh", about = "Lamport clock fleet simulator")]
struct Args {
    /// Path to the run configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Run only this actor of the membership instead of the whole fleet.
    #[arg(long)]
    actor: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = SimulationConfig::load(&args.config)?;
    info!(
        actors = config.actors.len(),
        run_secs = config.run_secs,
        log_dir = %config.log.dir.display(),
        "starting simulation"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, stopping fleet");
            let _ = shutdown_tx.send(true);
        }
    });

    match args.actor {
        Some(raw) => {
            let id = ActorId::new(raw);
            let stats = vm::run_single(&config, id, shutdown_rx).await?;
            info!(
                actor = %id,
                internal = stats.internal,
                sends = stats.sends,
                receives = stats.receives,
                total = stats.total_events(),
                "run complete"
            );
        }
        None => {
            let results = vm::run_fleet(&config, shutdown_rx).await?;
            for (id, stats) in results {
                info!(
                    actor = %id,
                    internal = stats.internal,
                    sends = stats.sends,
                    receives = stats.receives,
                    total = stats.total_events(),
                    "run complete"
                );
            }
        }
    }
    Ok(())
}
