use crate::{Hap, State, TimeSpan, Value, EPSILON};
use std::fmt;
use std::sync::Arc;

/// A Pattern represents a time-varying sequence of values
///
/// Patterns are queried with a State (containing a timespan) and return
/// the Haps overlapping that timespan.
pub struct Pattern {
    /// The query function that produces events for a given state
    query_func: Arc<dyn Fn(&State) -> Vec<Hap> + Send + Sync>,
}

impl Pattern {
    /// Create a new Pattern with a query function
    pub fn new<F>(query_func: F) -> Self
    where
        F: Fn(&State) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query_func: Arc::new(query_func),
        }
    }

    /// Query this pattern with the given state
    pub fn query(&self, state: &State) -> Vec<Hap> {
        (self.query_func)(state)
    }

    /// Query `[from, to)` reusing the controls and random source of `state`
    pub fn query_between(&self, state: &State, from: f64, to: f64) -> Vec<Hap> {
        self.query(&state.between(from, to))
    }

    /// Apply a function to each value in the pattern
    pub fn with_value<F>(self, func: F) -> Pattern
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |state| {
            query_func(state)
                .into_iter()
                .map(|hap| hap.with_value(&func))
                .collect()
        })
    }

    /// Apply a function to each hap
    pub fn with_hap<F>(self, func: F) -> Pattern
    where
        F: Fn(&Hap, &State) -> Hap + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |state| {
            query_func(state)
                .iter()
                .map(|hap| func(hap, state))
                .collect()
        })
    }

    /// Apply a function to all haps at once
    pub fn with_haps<F>(self, func: F) -> Pattern
    where
        F: Fn(Vec<Hap>, &State) -> Vec<Hap> + Send + Sync + 'static,
    {
        let query_func = self.query_func;
        Pattern::new(move |state| func(query_func(state), state))
    }

    /// Identity comparison: two handles to the same query function
    pub fn ptr_eq(&self, other: &Pattern) -> bool {
        Arc::ptr_eq(&self.query_func, &other.query_func)
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Pattern {
            query_func: self.query_func.clone(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pattern")
    }
}

/// Resolve an argument over `[from, to)`.
///
/// Nested patterns are queried and the first hap's value is taken
/// (recursively, if that value is itself a pattern). Raw values pass
/// through. An empty query resolves to `Value::Silence`.
pub fn sample(arg: &Value, state: &State, from: f64, to: f64) -> Value {
    match arg {
        Value::Pattern(pattern) => pattern
            .query(&state.set_span(TimeSpan::new(from, to)))
            .into_iter()
            .next()
            .map(|hap| sample(&hap.value, state, hap.from(), hap.to()))
            .unwrap_or(Value::Silence),
        other => other.clone(),
    }
}

/// Resolve an argument at a single instant
pub fn sample_at(arg: &Value, state: &State, time: f64) -> Value {
    sample(arg, state, time, time + EPSILON)
}

/// Resolve an argument to a number, falling back to `default`
pub fn sample_number(arg: &Value, state: &State, from: f64, to: f64, default: f64) -> f64 {
    sample(arg, state, from, to).as_number().unwrap_or(default)
}
