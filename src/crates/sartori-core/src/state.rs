use crate::{RandomSource, TimeSpan, Value};
use std::collections::HashMap;

/// Control key holding the current cycles-per-second
pub const CPS: &str = "cps";

/// State represents the context for querying a pattern
///
/// It carries the timespan being queried, control parameters supplied by
/// the caller (such as the current tempo) and the random source consumed by
/// randomized combinators.
#[derive(Debug, Clone)]
pub struct State {
    /// The timespan being queried
    pub span: TimeSpan,

    /// Control parameters (e.g. tempo)
    pub controls: HashMap<String, Value>,

    /// Random source shared by the whole query
    pub random: RandomSource,
}

impl State {
    /// Create a new State with the given timespan and a fresh random source
    pub fn new(span: TimeSpan) -> Self {
        State::with_random(span, RandomSource::from_entropy())
    }

    /// Create a new State with the given timespan and random source
    pub fn with_random(span: TimeSpan, random: RandomSource) -> Self {
        State {
            span,
            controls: HashMap::new(),
            random,
        }
    }

    /// Return a new State with a different span
    pub fn set_span(&self, span: TimeSpan) -> State {
        State {
            span,
            controls: self.controls.clone(),
            random: self.random.clone(),
        }
    }

    /// Return a new State spanning `[from, to)`
    pub fn between(&self, from: f64, to: f64) -> State {
        self.set_span(TimeSpan::new(from, to))
    }

    /// Return a new State with the span modified by a function
    pub fn with_span<F>(&self, func: F) -> State
    where
        F: FnOnce(&TimeSpan) -> TimeSpan,
    {
        self.set_span(func(&self.span))
    }

    /// Return a new State with a single control added
    pub fn set_control(&self, key: impl Into<String>, value: Value) -> State {
        let mut state = self.clone();
        state.controls.insert(key.into(), value);
        state
    }

    /// Get a control value by key
    pub fn get_control(&self, key: &str) -> Option<&Value> {
        self.controls.get(key)
    }

    /// Current cycles per second, defaulting to 0.5
    pub fn cps(&self) -> f64 {
        self.get_control(CPS)
            .and_then(Value::as_number)
            .unwrap_or(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_creation() {
        let span = TimeSpan::new(0.0, 1.0);
        let state = State::new(span);

        assert_eq!(state.span, span);
        assert!(state.controls.is_empty());
    }

    #[test]
    fn test_between_keeps_random_source() {
        let state = State::with_random(TimeSpan::new(0.0, 1.0), RandomSource::seeded(9));
        let moved = state.between(2.0, 3.0);

        assert_eq!(moved.span, TimeSpan::new(2.0, 3.0));
        assert_eq!(moved.random.seed(), 9);
    }

    #[test]
    fn test_cps_control() {
        let state = State::new(TimeSpan::new(0.0, 1.0));
        assert_eq!(state.cps(), 0.5);

        let state = state.set_control(CPS, Value::Number(2.0));
        assert_eq!(state.cps(), 2.0);
    }
}
