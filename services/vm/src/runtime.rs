//! The actor runtime state machine.
//!
//! `Starting`: establish the full mesh; an actor must never tick against a
//! partial mesh, so establishment either completes or the run fails.
//! `Running`: the fixed-rate tick loop; exactly one event per tick, receive
//! taking precedence over the random draw. `Stopping`: cooperative
//! teardown on deadline expiry, external shutdown, or a broken link; no
//! further sends, links closed, log flushed. `Stopped` is terminal.

use crate::core::{ActorCore, QuietTick};
use crate::picker::EventPicker;
use anyhow::{Context, Result};
use config::EventMixConfig;
use eventlog::{EventLogger, LoggerOptions};
use network::{Mesh, MeshOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use types::{ActorId, ClockRate};

/// Everything one actor needs to run, resolved from configuration by the
/// fleet launcher.
#[derive(Debug, Clone)]
pub struct ActorSpec {
    pub id: ActorId,
    pub rate: ClockRate,
    pub peers: Vec<(ActorId, SocketAddr)>,
    pub mix: EventMixConfig,
    pub log_dir: PathBuf,
    pub rotate_interval: Duration,
    pub run_duration: Duration,
    pub mesh_options: MeshOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Per-actor event totals reported after the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub internal: u64,
    pub sends: u64,
    pub receives: u64,
    /// Set when a link fault ended the run early.
    pub fault: Option<String>,
}

impl RunStats {
    pub fn total_events(&self) -> u64 {
        self.internal + self.sends + self.receives
    }
}

pub struct ActorRuntime {
    spec: ActorSpec,
    state: RunState,
}

impl ActorRuntime {
    pub fn new(spec: ActorSpec) -> Self {
        ActorRuntime {
            spec,
            state: RunState::Starting,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn set_state(&mut self, state: RunState) {
        debug!(actor = %self.spec.id, from = ?self.state, to = ?state, "state transition");
        self.state = state;
    }

    /// Drive the actor from `Starting` to `Stopped`. `listener` must be
    /// bound to this actor's configured address; `shutdown` is the external
    /// stop signal (Ctrl-C or fleet teardown).
    pub async fn run(
        mut self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunStats> {
        let spec = self.spec.clone();
        info!(actor = %spec.id, rate = %spec.rate, peers = spec.peers.len(), "actor starting");

        let mut mesh = Mesh::establish(spec.id, listener, &spec.peers, &spec.mesh_options)
            .await
            .with_context(|| format!("actor {}: failed to establish mesh", spec.id))?;
        let peers = mesh.peer_ids();

        let mut logger = EventLogger::open(
            &spec.log_dir,
            spec.id,
            LoggerOptions {
                rotate_interval: spec.rotate_interval,
                ..Default::default()
            },
        )
        .with_context(|| format!("actor {}: failed to open event log", spec.id))?;

        let mut core = ActorCore::new(
            spec.id,
            EventPicker::from_mix(&spec.mix),
            StdRng::from_entropy(),
        );
        let mut stats = RunStats::default();

        self.set_state(RunState::Running);
        let deadline = tokio::time::Instant::now() + spec.run_duration;
        let mut interval = tokio::time::interval(spec.rate.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // External shutdown as a one-shot future. A dropped sender means no
        // external stop will ever come, so that branch must go quiet rather
        // than spin.
        let shutdown_fired = async move {
            loop {
                if *shutdown.borrow() {
                    return;
                }
                if shutdown.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::pin!(shutdown_fired);

        'running: loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    debug!(actor = %spec.id, "run deadline reached");
                    break 'running;
                }
                _ = &mut shutdown_fired => {
                    info!(actor = %spec.id, "external shutdown requested");
                    break 'running;
                }
            }

            // A broken link is terminal: delivery is assumed reliable, so a
            // run that lost a link can no longer be trusted.
            if let Some(fault) = mesh.try_fault() {
                error!(actor = %spec.id, error = %fault, "link fault, stopping");
                stats.fault = Some(fault.to_string());
                break 'running;
            }

            // Pop first, then derive the pre-pop backlog from what remains.
            // A snapshot taken before the pop could race a push and log a
            // RECEIVE against a supposedly empty queue.
            if let Some(message) = mesh.queue().try_pop() {
                let queue_len = mesh.queue().len() + 1;
                let entry = core.on_receive(message, queue_len);
                logger.record(&entry)?;
                stats.receives += 1;
            } else {
                // Nothing was pending when the pop was attempted.
                match core.on_quiet_tick(&peers, 0) {
                    QuietTick::Internal { entry } => {
                        logger.record(&entry)?;
                        stats.internal += 1;
                    }
                    QuietTick::Send {
                        message,
                        targets,
                        entries,
                    } => {
                        for (target, entry) in targets.iter().zip(&entries) {
                            let link = mesh
                                .link(*target)
                                .expect("targets are drawn from the mesh's peer list");
                            if let Err(fault) = link.send(&message).await {
                                error!(actor = %spec.id, error = %fault, "send failed, stopping");
                                stats.fault = Some(fault.to_string());
                                break 'running;
                            }
                            logger.record(entry)?;
                            stats.sends += 1;
                        }
                    }
                }
            }

            if tokio::time::Instant::now() >= deadline {
                debug!(actor = %spec.id, "run deadline reached");
                break 'running;
            }
        }

        self.set_state(RunState::Stopping);
        mesh.shutdown().await;
        logger
            .close()
            .with_context(|| format!("actor {}: failed to close event log", spec.id))?;
        self.set_state(RunState::Stopped);

        info!(
            actor = %spec.id,
            internal = stats.internal,
            sends = stats.sends,
            receives = stats.receives,
            final_clock = core.clock_value(),
            "actor stopped"
        );
        Ok(stats)
    }
}
