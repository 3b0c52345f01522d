use crate::{Result, SchedulerError};
use serde::{Deserialize, Serialize};

/// Tick windows are rounded to this many cycles, so shorter ticks never advance
pub const MIN_TICK_DURATION: f64 = 0.001;

/// Timing parameters of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cycles compiled per tick
    pub tick_duration: f64,
    /// Seconds added to every event timestamp; also the per-tick work budget
    pub latency: f64,
    /// Cycles per second until the global stream sets a tempo
    pub default_cps: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            tick_duration: 0.125,
            latency: 0.1,
            default_cps: 0.5,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(SchedulerError::InvalidConfig(format!("{name} must be positive, got {value}")))
            }
        };
        positive("tick_duration", self.tick_duration)?;
        positive("default_cps", self.default_cps)?;
        if self.tick_duration < MIN_TICK_DURATION {
            return Err(SchedulerError::InvalidConfig(format!(
                "tick_duration must be at least {MIN_TICK_DURATION}, got {}",
                self.tick_duration
            )));
        }
        if !(self.latency >= 0.0 && self.latency.is_finite()) {
            return Err(SchedulerError::InvalidConfig(format!(
                "latency must not be negative, got {}",
                self.latency
            )));
        }
        Ok(())
    }
}
