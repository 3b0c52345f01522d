//! Control flow, tempo helpers and the stateful combinators
//!
//! `toggle`, `count` and `cache` each own a mutable cell that persists
//! across queries. Every query through any clone of the returned pattern
//! advances that one cell, so they should be queried once per tick.

use crate::combinators::{seq, slow, wrap};
use crate::error::Result;
use crate::ops::{div, mul};
use crate::pattern::{sample, sample_at};
use crate::{Hap, Pattern, Value, EPSILON};
use parking_lot::Mutex;
use std::sync::Arc;

/// Default number of values memoized by [`cache`]
pub const DEFAULT_CACHE_SIZE: usize = 16;

const MAX_CACHE_SIZE: usize = 4096;

/// Keep a hap's value only when it starts exactly at the query start; other haps become 0
pub fn falls_on_from(pattern: Pattern) -> Pattern {
    pattern.with_hap(|hap, state| {
        if (hap.from() - state.span.begin).abs() < EPSILON {
            hap.clone()
        } else {
            Hap::new(hap.span, Value::Number(0.0))
        }
    })
}

/// 1 at the start of every `interval` cycles, else 0
pub fn every(interval: Value) -> Result<Pattern> {
    let pulse = seq(vec![Value::Number(1.0)])?;
    Ok(falls_on_from(slow(interval, pulse)?))
}

/// Query `then` while `condition` is truthy at the query span, otherwise `otherwise`
pub fn ifelse(then: Value, otherwise: Value, condition: Value) -> Pattern {
    let then = wrap(then);
    let otherwise = wrap(otherwise);
    Pattern::new(move |state| {
        let span = state.span;
        if sample(&condition, state, span.begin, span.end).is_truthy() {
            then.query(state)
        } else {
            otherwise.query(state)
        }
    })
}

/// Flip between 1 and 0 each time `condition` is truthy
pub fn toggle(condition: Value) -> Pattern {
    let cell = Arc::new(Mutex::new(false));
    Pattern::new(move |state| {
        let span = state.span;
        let flip = sample(&condition, state, span.begin, span.end).is_truthy();
        let mut on = cell.lock();
        if flip {
            *on = !*on;
        }
        vec![Hap::new(span, Value::Number(if *on { 1.0 } else { 0.0 }))]
    })
}

/// Count how many times `condition` has been truthy
pub fn count(condition: Value) -> Pattern {
    let cell = Arc::new(Mutex::new(0u64));
    Pattern::new(move |state| {
        let span = state.span;
        let triggered = sample(&condition, state, span.begin, span.end).is_truthy();
        let mut counter = cell.lock();
        if triggered {
            *counter += 1;
        }
        vec![Hap::new(span, Value::Number(*counter as f64))]
    })
}

/// Sample `size` values of `source` across the query window and replay them
/// on later queries until `clear` fires exactly at a query start.
pub fn cache(size: Value, clear: Option<Value>, source: Value) -> Pattern {
    let memory: Arc<Mutex<Vec<Value>>> = Arc::default();
    let clear = clear.map(|c| Value::Pattern(falls_on_from(wrap(c))));

    Pattern::new(move |state| {
        let span = state.span;
        let cleared = clear
            .as_ref()
            .map(|c| sample(c, state, span.begin, span.end).is_truthy())
            .unwrap_or(false);

        let mut values = memory.lock().clone();
        if cleared || values.is_empty() {
            let size = match sample(&size, state, span.begin, span.end).as_number() {
                Some(n) if n >= 1.0 => (n as usize).min(MAX_CACHE_SIZE),
                _ => DEFAULT_CACHE_SIZE,
            };
            values = (0..size)
                .map(|i| sample_at(&source, state, span.lerp(i as f64 / size as f64)))
                .collect();
            *memory.lock() = values.clone();
        }

        seq(values).map(|p| p.query(state)).unwrap_or_default()
    })
}

/// The current cycle index
pub fn current_cycle() -> Pattern {
    Pattern::new(|state| vec![Hap::new(state.span, Value::Number(state.span.begin.trunc()))])
}

/// The current cycles per second, read from the query controls
pub fn cps() -> Pattern {
    Pattern::new(|state| vec![Hap::new(state.span, Value::Number(state.cps()))])
}

/// Cycles to seconds
pub fn cts(cycles: Value) -> Pattern {
    div(Value::Pattern(cps()), wrap(cycles))
}

/// Cycles to milliseconds
pub fn ctms(cycles: Value) -> Pattern {
    mul(Value::Number(1000.0), cts(cycles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::cat;
    use crate::probability::coin;
    use crate::state::CPS;
    use crate::testing::{numbers, state};

    fn first(pattern: &Pattern, from: f64, to: f64) -> f64 {
        numbers(&pattern.query(&state(from, to)))[0]
    }

    #[test]
    fn test_falls_on_from() {
        let pulse = seq(vec![Value::from(1.0)]).unwrap();
        let pattern = falls_on_from(pulse);
        assert_eq!(first(&pattern, 0.0, 1.0), 1.0);
        assert_eq!(first(&pattern, 0.5, 1.5), 0.0);
    }

    #[test]
    fn test_every() {
        let pattern = every(Value::from(2.0)).unwrap();
        assert_eq!(first(&pattern, 0.0, 0.125), 1.0);
        assert_eq!(first(&pattern, 1.0, 1.125), 0.0);
        assert_eq!(first(&pattern, 2.0, 2.125), 1.0);
        assert!(every(Value::from(0.0)).is_err());
    }

    #[test]
    fn test_ifelse() {
        let condition = Value::Pattern(cat(vec![Value::from(1.0), Value::from(0.0)]).unwrap());
        let pattern = ifelse(Value::from("a"), Value::from("b"), condition);
        assert_eq!(pattern.query(&state(0.0, 1.0))[0].value, Value::from("a"));
        assert_eq!(pattern.query(&state(1.0, 2.0))[0].value, Value::from("b"));
    }

    #[test]
    fn test_toggle_flips_on_truthy_condition() {
        let pattern = toggle(Value::Pattern(cat(vec![Value::from(1.0), Value::from(0.0)]).unwrap()));
        let seen: Vec<f64> = (0..4).map(|k| first(&pattern, k as f64, k as f64 + 1.0)).collect();
        assert_eq!(seen, vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_count_accumulates() {
        let pattern = count(Value::from(1.0));
        let seen: Vec<f64> = (0..3).map(|k| first(&pattern, k as f64, k as f64 + 1.0)).collect();
        assert_eq!(seen, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cache_repeats_until_cleared() {
        let pattern = cache(Value::from(4.0), None, Value::Pattern(coin()));
        let cycle0 = numbers(&pattern.query(&state(0.0, 1.0)));
        let cycle5 = numbers(&pattern.query(&state(5.0, 6.0)));
        assert_eq!(cycle0.len(), 4);
        assert_eq!(cycle0, cycle5);
    }

    #[test]
    fn test_cache_refills_on_clear() {
        let source = Value::Pattern(current_cycle());
        let pattern = cache(Value::from(2.0), Some(Value::Pattern(every(Value::from(2.0)).unwrap())), source);

        assert_eq!(numbers(&pattern.query(&state(0.0, 1.0))), vec![0.0, 0.0]);
        assert_eq!(numbers(&pattern.query(&state(1.0, 2.0))), vec![0.0, 0.0]);
        assert_eq!(numbers(&pattern.query(&state(2.0, 3.0))), vec![2.0, 2.0]);
    }

    #[test]
    fn test_tempo_helpers() {
        let st = state(3.5, 4.0).set_control(CPS, Value::from(2.0));
        assert_eq!(numbers(&current_cycle().query(&st)), vec![3.0]);
        assert_eq!(numbers(&cps().query(&st)), vec![2.0]);
        assert_eq!(numbers(&cts(Value::from(4.0)).query(&st)), vec![2.0]);
        assert_eq!(numbers(&ctms(Value::from(1.0)).query(&st)), vec![500.0]);
    }
}
