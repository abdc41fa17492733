//! Fleet bootstrap.
//!
//! Binds every actor's listener before any runtime starts (so initiators
//! always find an accept queue), draws each actor's clock rate, and runs
//! the runtimes either all in-process as isolated tasks or one per process
//! with `--actor`.

use crate::runtime::{ActorRuntime, ActorSpec, RunStats};
use anyhow::{anyhow, Context, Result};
use config::SimulationConfig;
use network::MeshOptions;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use types::{ActorId, ClockRate};

fn spec_for(config: &SimulationConfig, id: ActorId, rate: ClockRate) -> ActorSpec {
    ActorSpec {
        id,
        rate,
        peers: config.peers_of(id),
        mix: config.mix,
        log_dir: config.log.dir.clone(),
        rotate_interval: config.rotate_interval(),
        run_duration: config.run_duration(),
        mesh_options: MeshOptions::default(),
    }
}

fn draw_rate(config: &SimulationConfig, rng: &mut StdRng) -> Result<ClockRate> {
    ClockRate::draw(rng, config.rates.min, config.rates.max)
        .map_err(|e| anyhow!("failed to draw clock rate: {e}"))
}

/// Run the whole fleet in this process, one isolated task per actor.
/// Returns per-actor stats once every actor has stopped.
pub async fn run_fleet(
    config: &SimulationConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<Vec<(ActorId, RunStats)>> {
    let mut rng = StdRng::from_entropy();

    // Bind all listeners before spawning anything: an initiator must never
    // race a peer that has not reserved its address yet.
    let mut actors = Vec::new();
    for actor in &config.actors {
        let listener = TcpListener::bind(actor.addr)
            .await
            .with_context(|| format!("actor {}: failed to bind {}", actor.id, actor.addr))?;
        let rate = draw_rate(config, &mut rng)?;
        info!(actor = %actor.id, addr = %actor.addr, rate = %rate, "actor configured");
        actors.push((actor.id, listener, rate));
    }

    let mut handles = Vec::new();
    for (id, listener, rate) in actors {
        let spec = spec_for(config, id, rate);
        let shutdown = shutdown.clone();
        handles.push((
            id,
            tokio::spawn(async move { ActorRuntime::new(spec).run(listener, shutdown).await }),
        ));
    }

    let mut results = Vec::new();
    for (id, handle) in handles {
        let stats = handle
            .await
            .map_err(|e| anyhow!("actor {id} task failed: {e}"))?
            .with_context(|| format!("actor {id} run failed"))?;
        if let Some(fault) = &stats.fault {
            warn!(actor = %id, fault = %fault, "actor stopped on link fault");
        }
        results.push((id, stats));
    }
    Ok(results)
}

/// Run a single actor of the fleet in this process (the per-process
/// deployment mode). The rest of the membership is expected to be running
/// elsewhere.
pub async fn run_single(
    config: &SimulationConfig,
    id: ActorId,
    shutdown: watch::Receiver<bool>,
) -> Result<RunStats> {
    let actor = config
        .actor(id)
        .ok_or_else(|| anyhow!("actor {id} is not in the configured membership"))?;
    let listener = TcpListener::bind(actor.addr)
        .await
        .with_context(|| format!("actor {id}: failed to bind {}", actor.addr))?;

    let mut rng = StdRng::from_entropy();
    let rate = draw_rate(config, &mut rng)?;
    info!(actor = %id, addr = %actor.addr, rate = %rate, "actor configured");

    let spec = spec_for(config, id, rate);
    ActorRuntime::new(spec).run(listener, shutdown).await
}
