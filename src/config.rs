//! Engine-wide configuration.
//!
//! Loaded the way the teacher's `Config` is (`figment` layering `Toml` defaults with
//! an environment override), scoped down to the two knobs `spec.md` leaves
//! implementation-defined: the bounded channel capacity used for every tuple
//! channel, and the worker width for restrict/join ("available parallelism",
//! `spec.md` §4.6/§4.10).

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::eval::DEFAULT_CHANNEL_CAPACITY;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bounded capacity of every `mpsc` tuple channel opened by `stream`.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Worker width for restrict and join. `None` means "available parallelism".
    #[serde(default)]
    pub worker_width: Option<usize>,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            worker_width: None,
        }
    }
}

impl EngineConfig {
    /// Load `relalg.toml` (if present) layered under `RELALG_`-prefixed environment
    /// variables, falling back to [`EngineConfig::default`] entirely when neither is set.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("relalg.toml"))
            .merge(Env::prefixed("RELALG_").split("__"))
            .extract()
    }

    /// The resolved worker width: `worker_width` if set, else the host's available
    /// parallelism, with a floor of 1 (`spec.md` §4.6: "max(1, available parallelism)").
    pub fn resolved_worker_width(&self) -> usize {
        self.worker_width.unwrap_or_else(num_cpus::get).max(1)
    }
}
