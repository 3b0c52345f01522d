//! Settings file
//!
//! ```toml
//! seed = 42
//!
//! [scheduler]
//! tick_duration = 0.125
//! latency = 0.1
//! default_cps = 0.5
//!
//! [streams]
//! instruments = 16
//! effects = 4
//! ```

use anyhow::Context;
use sartori_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::stream::StreamPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub instruments: usize,
    pub effects: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        StreamSettings {
            instruments: 16,
            effects: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scheduler: SchedulerConfig,
    pub streams: StreamSettings,
    /// Seed for the random source; entropy when absent
    pub seed: Option<u64>,
}

impl Settings {
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(source).context("invalid settings")?;
        settings.scheduler.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("in {}", path.display()))
    }

    pub fn pool(&self) -> StreamPool {
        StreamPool::new(self.streams.instruments, self.streams.effects)
    }
}
