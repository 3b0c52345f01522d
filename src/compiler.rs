//! Evaluation of user scripts and compilation of the stream pool

use crate::diagnostics::Diagnostics;
use crate::script::{self, ScriptError};
use crate::stream::{StreamPool, EVENTS};
use sartori_core::{
    sample_at, Compiled, EventKind, RandomSource, State, TempoChange, TimeSpan, Value, CPS,
};
use sartori_scheduler::EventSource;
use tracing::{debug, warn};

/// Event parameter that drops the event when truthy
pub const MUTE: &str = "mute";

/// Owns the stream pool and the last script that evaluated cleanly
#[derive(Debug)]
pub struct Compiler {
    pool: StreamPool,
    last_good: Option<String>,
    random: RandomSource,
    diagnostics: Diagnostics,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(StreamPool::default(), RandomSource::from_entropy(), Diagnostics::new())
    }
}

impl Compiler {
    pub fn new(pool: StreamPool, random: RandomSource, diagnostics: Diagnostics) -> Self {
        Compiler {
            pool,
            last_good: None,
            random,
            diagnostics,
        }
    }

    pub fn pool(&self) -> &StreamPool {
        &self.pool
    }

    pub fn last_good(&self) -> Option<&str> {
        self.last_good.as_deref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Reset every stream and run `code`. On failure the last good source
    /// is restored and the error is both broadcast and returned.
    pub fn evaluate(&mut self, code: &str) -> Result<(), ScriptError> {
        self.pool.reset();
        match script::run(code, &mut self.pool) {
            Ok(()) => {
                debug!(bytes = code.len(), "evaluated");
                self.last_good = Some(code.to_string());
                Ok(())
            }
            Err(err) => {
                self.pool.reset();
                if let Some(previous) = &self.last_good {
                    if let Err(again) = script::run(previous, &mut self.pool) {
                        warn!(%again, "last good source no longer evaluates");
                        self.pool.reset();
                    }
                }
                self.diagnostics.error(err.to_string());
                Err(err)
            }
        }
    }

    /// Query state for `[from, to)` carrying the tempo control
    pub fn state(&self, from: f64, to: f64, cps: f64) -> State {
        State::with_random(TimeSpan::new(from, to), self.random.clone()).set_control(CPS, Value::Number(cps))
    }

    /// Tempo changes from the global stream and events from every other
    /// stream, ordered by cycle time
    pub fn compile(&self, from: f64, to: f64, cps: f64) -> Compiled {
        let state = self.state(from, to, cps);
        let mut compiled = Compiled {
            tempo: self.tempo(&state),
            events: Vec::new(),
        };

        for stream in self.pool.streams() {
            compiled.events.extend(stream.query(&state).into_iter().filter(|event| {
                event.kind == EventKind::Mutation
                    || !event.params.get(MUTE).is_some_and(Value::is_truthy)
            }));
        }
        compiled
            .events
            .sort_by(|a, b| a.cycle_time.total_cmp(&b.cycle_time));
        compiled
    }

    fn tempo(&self, state: &State) -> Vec<TempoChange> {
        let global = self.pool.global();
        if global.contains(EVENTS) {
            return global
                .query(state)
                .into_iter()
                .filter(|event| event.kind == EventKind::Event)
                .filter_map(|event| {
                    let cps = first_number(event.params.get(CPS)?)?;
                    Some(TempoChange {
                        cycle_time: event.cycle_time,
                        cps,
                    })
                })
                .collect();
        }
        if global.contains(CPS) {
            let value = sample_at(&Value::Pattern(global.get(CPS)), state, state.span.begin);
            if let Some(cps) = first_number(&value) {
                return vec![TempoChange {
                    cycle_time: state.span.begin,
                    cps,
                }];
            }
        }
        Vec::new()
    }
}

fn first_number(value: &Value) -> Option<f64> {
    match value {
        Value::List(items) => items.first().and_then(first_number),
        other => other.as_number(),
    }
}

impl EventSource for Compiler {
    fn compile(&mut self, from: f64, to: f64, cps: f64) -> Compiled {
        Compiler::compile(self, from, to, cps)
    }
}
