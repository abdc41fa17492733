//! # Tickmesh Run Configuration
//!
//! Everything the core consumes at startup: the fixed actor membership with
//! listen addresses, the clock-rate range, the run duration, log placement
//! and rotation, and the event-mix weights driving each tick's random draw.
//! Loaded from a TOML file; every section except the actor list has
//! defaults.
//!
//! ```toml
//! run_secs = 60
//!
//! [[actors]]
//! id = 1
//! addr = "127.0.0.1:10001"
//!
//! [[actors]]
//! id = 2
//! addr = "127.0.0.1:10002"
//!
//! [rates]
//! min = 1
//! max = 6
//!
//! [log]
//! dir = "logs"
//! rotate_secs = 120
//!
//! [mix]
//! internal = 7
//! send_first = 1
//! send_second = 1
//! broadcast = 1
//! ```

use anyhow::{bail, Context, Result};
use config_crate::{Config, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use types::ActorId;

/// One actor's fixed identity and listen address.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActorConfig {
    pub id: ActorId,
    pub addr: SocketAddr,
}

/// Inclusive range the per-actor clock rate is drawn from.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RateRange {
    pub min: u32,
    pub max: u32,
}

impl Default for RateRange {
    fn default() -> Self {
        Self { min: 1, max: 6 }
    }
}

/// Log output placement and rotation cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_rotate_secs")]
    pub rotate_secs: u64,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_rotate_secs() -> u64 {
    120
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            rotate_secs: default_rotate_secs(),
        }
    }
}

/// Event-mix weights as explicit bucket counts.
///
/// The tick loop draws uniformly over `sum(weights)` buckets; the defaults
/// reproduce the classic 70% internal / 30% send split of a 1..=10 draw
/// where 1, 2, 3 select the send outcomes.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EventMixConfig {
    #[serde(default = "default_internal_weight")]
    pub internal: u32,
    #[serde(default = "default_send_weight")]
    pub send_first: u32,
    #[serde(default = "default_send_weight")]
    pub send_second: u32,
    #[serde(default = "default_send_weight")]
    pub broadcast: u32,
}

fn default_internal_weight() -> u32 {
    7
}

fn default_send_weight() -> u32 {
    1
}

impl Default for EventMixConfig {
    fn default() -> Self {
        Self {
            internal: default_internal_weight(),
            send_first: default_send_weight(),
            send_second: default_send_weight(),
            broadcast: default_send_weight(),
        }
    }
}

impl EventMixConfig {
    pub fn total_weight(&self) -> u32 {
        self.internal + self.send_first + self.send_second + self.broadcast
    }
}

/// Full startup configuration for one run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub actors: Vec<ActorConfig>,
    pub run_secs: u64,
    #[serde(default)]
    pub rates: RateRange,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub mix: EventMixConfig,
}

impl SimulationConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path))
            .build()
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: SimulationConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        config.validate()?;
        debug!(
            actors = config.actors.len(),
            run_secs = config.run_secs,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.actors.is_empty() {
            bail!("configuration must declare at least one actor");
        }
        let mut ids = BTreeSet::new();
        let mut addrs = BTreeSet::new();
        for actor in &self.actors {
            if !ids.insert(actor.id) {
                bail!("duplicate actor id {}", actor.id);
            }
            if !addrs.insert(actor.addr) {
                bail!("duplicate actor address {}", actor.addr);
            }
        }
        if self.run_secs == 0 {
            bail!("run_secs must be positive");
        }
        if self.rates.min == 0 || self.rates.min > self.rates.max {
            bail!(
                "invalid rate range {}..={} (min must be >= 1 and <= max)",
                self.rates.min,
                self.rates.max
            );
        }
        if self.log.rotate_secs == 0 {
            bail!("log.rotate_secs must be positive");
        }
        if self.mix.total_weight() == 0 {
            bail!("event mix weights must not all be zero");
        }
        Ok(())
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorConfig> {
        self.actors.iter().find(|a| a.id == id)
    }

    /// Membership seen from one actor: every other actor with its address.
    pub fn peers_of(&self, id: ActorId) -> Vec<(ActorId, SocketAddr)> {
        self.actors
            .iter()
            .filter(|a| a.id != id)
            .map(|a| (a.id, a.addr))
            .collect()
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.run_secs)
    }

    pub fn rotate_interval(&self) -> Duration {
        Duration::from_secs(self.log.rotate_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
        run_secs = 30

        [[actors]]
        id = 1
        addr = "127.0.0.1:10001"

        [[actors]]
        id = 2
        addr = "127.0.0.1:10002"
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let file = write_config(MINIMAL);
        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.actors.len(), 2);
        assert_eq!(config.rates.min, 1);
        assert_eq!(config.rates.max, 6);
        assert_eq!(config.log.rotate_secs, 120);
        assert_eq!(config.mix.internal, 7);
        assert_eq!(config.mix.total_weight(), 10);
        assert_eq!(config.run_duration(), Duration::from_secs(30));
    }

    #[test]
    fn peers_of_excludes_self() {
        let file = write_config(MINIMAL);
        let config = SimulationConfig::load(file.path()).unwrap();
        let peers = config.peers_of(ActorId::new(1));
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].0, ActorId::new(2));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let file = write_config(
            r#"
            run_secs = 30
            [[actors]]
            id = 1
            addr = "127.0.0.1:10001"
            [[actors]]
            id = 1
            addr = "127.0.0.1:10002"
        "#,
        );
        let err = SimulationConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate actor id"));
    }

    #[test]
    fn rejects_bad_rate_range() {
        let file = write_config(&format!(
            "{MINIMAL}\n[rates]\nmin = 5\nmax = 2\n"
        ));
        let err = SimulationConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid rate range"));
    }

    #[test]
    fn rejects_all_zero_mix() {
        let file = write_config(&format!(
            "{MINIMAL}\n[mix]\ninternal = 0\nsend_first = 0\nsend_second = 0\nbroadcast = 0\n"
        ));
        let err = SimulationConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("event mix weights"));
    }

    #[test]
    fn custom_mix_overrides_defaults() {
        let file = write_config(&format!("{MINIMAL}\n[mix]\ninternal = 4\n"));
        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.mix.internal, 4);
        assert_eq!(config.mix.total_weight(), 7);
    }

    #[test]
    fn missing_file_is_an_error_with_context() {
        let err = SimulationConfig::load("/nonexistent/sim.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
