//! Shared helpers for the end-to-end fleet tests.

use config::{ActorConfig, EventMixConfig, LogConfig, RateRange, SimulationConfig};
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use types::ActorId;

/// Reserve `n` distinct loopback ports. The listeners are dropped so the
/// fleet can re-bind the addresses immediately.
pub async fn free_addrs(n: usize) -> Vec<SocketAddr> {
    let mut listeners = Vec::new();
    for _ in 0..n {
        listeners.push(TcpListener::bind("127.0.0.1:0").await.unwrap());
    }
    listeners
        .iter()
        .map(|l| l.local_addr().unwrap())
        .collect()
}

/// A fleet configuration with actor ids 1..=n over the given addresses.
pub fn fleet_config(
    addrs: &[SocketAddr],
    run_secs: u64,
    rotate_secs: u64,
    rates: RateRange,
    log_dir: &Path,
) -> SimulationConfig {
    SimulationConfig {
        actors: addrs
            .iter()
            .enumerate()
            .map(|(i, addr)| ActorConfig {
                id: ActorId::new(i as u32 + 1),
                addr: *addr,
            })
            .collect(),
        run_secs,
        rates,
        log: LogConfig {
            dir: log_dir.to_path_buf(),
            rotate_secs,
        },
        mix: EventMixConfig::default(),
    }
}
