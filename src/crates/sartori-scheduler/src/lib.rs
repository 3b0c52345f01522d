//! Realtime scheduling for Sartori
//!
//! The [`Scheduler`] turns a window of cycles into timestamped events:
//! each tick it asks an [`EventSource`] to compile the next slice of
//! cycles, applies any tempo changes, converts cycle times to seconds and
//! hands every event to the registered [`EventHandler`]s. A [`Clock`]
//! drives ticks from a [`TimeSource`], and [`Player`] ties the two
//! together behind one lock.

pub mod clock;
pub mod config;
pub mod player;
pub mod scheduler;

pub use clock::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use config::{SchedulerConfig, MIN_TICK_DURATION};
pub use player::Player;
pub use scheduler::{PlayState, Scheduler, Tempo, TickReport};

pub use sartori_core::{Compiled, Event, EventKind, TempoChange};

/// Scheduling errors. None of these stop the clock.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    #[error("tick [{from}, {to}) took {elapsed:.3}s, over the {budget:.3}s budget")]
    Overrun {
        from: f64,
        to: f64,
        elapsed: f64,
        budget: f64,
    },

    #[error("handler {handler} failed: {message}")]
    Handler { handler: String, message: String },

    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Compiles the events of a window of cycles
pub trait EventSource: Send {
    fn compile(&mut self, from: f64, to: f64, cps: f64) -> Compiled;
}

/// Receives each event with its timestamp in seconds
pub trait EventHandler: Send {
    fn name(&self) -> &str;

    fn handle(&mut self, event: &Event, time: f64) -> anyhow::Result<()>;
}

/// Callback receiving errors reported during ticks
pub type ErrorSink = Box<dyn Fn(&SchedulerError) + Send>;
