use crate::error::{PatternError, Result};
use crate::pattern::sample;
use crate::{Hap, Pattern, State, TimeSpan, Value};
use std::sync::Arc;
use tracing::warn;

/// Per-cycle dispatch.
///
/// For a query `[from, to)` the callback runs once for every integer cycle
/// `f` in `[floor(from), ceil(to))` with a state spanning `[f, f + 1)`.
/// Haps whose value is a nested pattern are replaced by that pattern's haps
/// over the hap's own span, and anything outside the original query is
/// dropped.
pub fn cycle<F>(callback: F) -> Pattern
where
    F: Fn(i64, &State) -> Vec<Hap> + Send + Sync + 'static,
{
    Pattern::new(move |state| {
        let span = state.span;
        let mut bag = Vec::new();

        for index in span.cycles() {
            let begin = index as f64;
            let cycle_state = state.between(begin, begin + 1.0);
            for hap in callback(index, &cycle_state) {
                expand(hap, state, &mut bag);
            }
        }

        bag.retain(|hap| hap.span.overlaps(&span));
        bag
    })
}

fn expand(hap: Hap, state: &State, bag: &mut Vec<Hap>) {
    match hap.value {
        Value::Pattern(pattern) => {
            for inner in pattern.query(&state.set_span(hap.span)) {
                expand(inner, state, bag);
            }
        }
        value => bag.push(Hap::new(hap.span, value)),
    }
}

/// A pattern returning the value over exactly the queried span
pub fn pure(value: Value) -> Pattern {
    Pattern::new(move |state| vec![Hap::new(state.span, value.clone())])
}

/// Create an empty/silent pattern
pub fn silence() -> Pattern {
    Pattern::new(|_state| Vec::new())
}

/// Turn any value into a pattern: patterns pass through, anything else
/// repeats once per cycle
pub fn wrap(value: Value) -> Pattern {
    match value {
        Value::Pattern(pattern) => pattern,
        value => cycle(move |_, state| vec![Hap::new(state.span, value.clone())]),
    }
}

fn non_empty(name: &str, values: Vec<Value>) -> Result<Arc<Vec<Value>>> {
    if values.is_empty() {
        return Err(PatternError::empty(name));
    }
    Ok(Arc::new(values))
}

fn cat_values(values: Arc<Vec<Value>>) -> Pattern {
    let count = values.len() as i64;
    cycle(move |index, state| {
        let value = values[index.rem_euclid(count) as usize].clone();
        vec![Hap::new(state.span, value)]
    })
}

/// One value per cycle, chosen by `cycle mod len`
pub fn cat(values: Vec<Value>) -> Result<Pattern> {
    Ok(cat_values(non_empty("cat", values)?))
}

/// Alias for [`cat`]
pub fn set(values: Vec<Value>) -> Result<Pattern> {
    Ok(cat_values(non_empty("set", values)?))
}

/// Divide each cycle evenly among the values
pub fn seq(values: Vec<Value>) -> Result<Pattern> {
    let values = non_empty("seq", values)?;
    let count = values.len() as f64;
    Ok(scaled(cat_values(values), Speed::Fast(count)))
}

/// Pick one value per cycle from the state's random source
pub fn choose(values: Vec<Value>) -> Result<Pattern> {
    let values = non_empty("choose", values)?;
    Ok(cycle(move |_, state| {
        let value = values[state.random.index(values.len())].clone();
        vec![Hap::new(state.span, value)]
    }))
}

/// Layer all values over the same span
pub fn stack(values: Vec<Value>) -> Result<Pattern> {
    let values = non_empty("stack", values)?;
    Ok(cycle(move |_, state| {
        values
            .iter()
            .map(|value| Hap::new(state.span, value.clone()))
            .collect()
    }))
}

#[derive(Debug, Clone, Copy)]
enum Speed {
    Fast(f64),
    Slow(f64),
}

impl Speed {
    fn query_span(self, span: TimeSpan) -> TimeSpan {
        match self {
            Speed::Fast(f) => TimeSpan::new(span.begin * f, span.end * f),
            Speed::Slow(f) => TimeSpan::new(span.begin / f, span.end / f),
        }
    }

    fn hap_span(self, span: &TimeSpan) -> TimeSpan {
        match self {
            Speed::Fast(f) => TimeSpan::new(span.begin / f, span.end / f),
            Speed::Slow(f) => TimeSpan::new(span.begin * f, span.end * f),
        }
    }
}

fn scaled_query(pattern: &Pattern, state: &State, speed: Speed) -> Vec<Hap> {
    pattern
        .query(&state.set_span(speed.query_span(state.span)))
        .into_iter()
        .map(|hap| hap.with_span(|span| speed.hap_span(span)))
        .collect()
}

fn scaled(pattern: Pattern, speed: Speed) -> Pattern {
    Pattern::new(move |state| scaled_query(&pattern, state, speed))
}

fn valid_factor(factor: f64) -> bool {
    factor > 0.0 && factor.is_finite()
}

fn time_warp(name: &'static str, factor: Value, pattern: Pattern, speed: fn(f64) -> Speed) -> Result<Pattern> {
    if !matches!(factor, Value::Pattern(_)) {
        return match factor.as_number() {
            Some(f) if valid_factor(f) => Ok(scaled(pattern, speed(f))),
            _ => Err(PatternError::invalid_factor(name, &factor)),
        };
    }

    Ok(Pattern::new(move |state| {
        let span = state.span;
        match sample(&factor, state, span.begin, span.end).as_number() {
            Some(f) if valid_factor(f) => scaled_query(&pattern, state, speed(f)),
            other => {
                warn!(combinator = name, factor = ?other, %span, "invalid factor, span left silent");
                Vec::new()
            }
        }
    }))
}

/// Speed up a pattern. The factor may be a pattern, sampled at the query start.
pub fn fast(factor: Value, pattern: Pattern) -> Result<Pattern> {
    time_warp("fast", factor, pattern, Speed::Fast)
}

/// Slow down a pattern. `slow(f, p)` is `fast(1 / f, p)`.
pub fn slow(factor: Value, pattern: Pattern) -> Result<Pattern> {
    time_warp("slow", factor, pattern, Speed::Slow)
}

impl Pattern {
    /// Method form of [`fast`]
    pub fn fast(self, factor: impl Into<Value>) -> Result<Pattern> {
        fast(factor.into(), self)
    }

    /// Method form of [`slow`]
    pub fn slow(self, factor: impl Into<Value>) -> Result<Pattern> {
        slow(factor.into(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{numbers, spans, state};
    use proptest::prelude::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn test_pure() {
        let haps = pure(Value::from("bd")).query(&state(0.25, 0.5));
        assert_eq!(haps, vec![Hap::from_bounds(0.25, 0.5, "bd")]);
    }

    #[test]
    fn test_silence() {
        assert!(silence().query(&state(0.0, 4.0)).is_empty());
    }

    #[test]
    fn test_cat_one_value_per_cycle() {
        let pattern = cat(nums(&[1.0, 2.0, 3.0])).unwrap();
        for k in 0..7 {
            let haps = pattern.query(&state(k as f64, k as f64 + 1.0));
            assert_eq!(haps.len(), 1);
            assert_eq!(haps[0].value, Value::from([1.0, 2.0, 3.0][k % 3]));
            assert_eq!(haps[0].span, TimeSpan::new(k as f64, k as f64 + 1.0));
        }
    }

    #[test]
    fn test_cat_negative_cycles_wrap() {
        let pattern = cat(nums(&[1.0, 2.0, 3.0])).unwrap();
        let haps = pattern.query(&state(-1.0, 0.0));
        assert_eq!(numbers(&haps), vec![3.0]);
    }

    #[test]
    fn test_seq_divides_cycle() {
        let haps = seq(nums(&[1.0, 2.0, 3.0, 4.0])).unwrap().query(&state(0.0, 1.0));
        assert_eq!(numbers(&haps), vec![1.0, 2.0, 3.0, 4.0]);
        for (i, hap) in haps.iter().enumerate() {
            assert!((hap.from() - i as f64 * 0.25).abs() < 1e-9);
            assert!((hap.span.duration() - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seq_nested_pattern_fills_slot() {
        let inner = seq(nums(&[2.0, 3.0])).unwrap();
        let outer = seq(vec![Value::from(1.0), Value::Pattern(inner)]).unwrap();

        let haps = outer.query(&state(0.0, 1.0));
        assert_eq!(numbers(&haps), vec![1.0, 2.0, 3.0]);
        assert_eq!(haps[1].span, TimeSpan::new(0.5, 0.75));
        assert_eq!(haps[2].span, TimeSpan::new(0.75, 1.0));
    }

    #[test]
    fn test_partial_query_keeps_overlapping_haps() {
        let haps = seq(nums(&[1.0, 2.0, 3.0, 4.0])).unwrap().query(&state(0.3, 0.6));
        assert_eq!(numbers(&haps), vec![2.0, 3.0]);
    }

    #[test]
    fn test_fast_halves_bounds() {
        let pattern = seq(nums(&[1.0, 2.0, 3.0])).unwrap();
        let fast_haps = pattern.clone().fast(2.0).unwrap().query(&state(0.0, 1.0));
        let slow_haps = pattern.query(&state(0.0, 2.0));

        assert_eq!(fast_haps.len(), slow_haps.len());
        for (a, b) in fast_haps.iter().zip(&slow_haps) {
            assert_eq!(a.value, b.value);
            assert!((a.from() - b.from() / 2.0).abs() < 1e-9);
            assert!((a.to() - b.to() / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_slow_stretches() {
        let haps = seq(nums(&[1.0, 2.0])).unwrap().slow(2.0).unwrap().query(&state(0.0, 2.0));
        assert_eq!(haps, vec![Hap::from_bounds(0.0, 1.0, 1.0), Hap::from_bounds(1.0, 2.0, 2.0)]);
    }

    #[test]
    fn test_patterned_factor() {
        let factor = Value::Pattern(cat(nums(&[1.0, 2.0])).unwrap());
        let pattern = fast(factor, seq(nums(&[7.0])).unwrap()).unwrap();

        assert_eq!(pattern.query(&state(0.0, 1.0)).len(), 1);
        assert_eq!(pattern.query(&state(1.0, 2.0)).len(), 2);
    }

    #[test]
    fn test_invalid_factors() {
        let p = seq(nums(&[1.0])).unwrap();
        assert!(matches!(fast(Value::from(0.0), p.clone()), Err(PatternError::InvalidFactor { .. })));
        assert!(matches!(slow(Value::from(-2.0), p.clone()), Err(PatternError::InvalidFactor { .. })));
        assert!(matches!(fast(Value::from("x"), p), Err(PatternError::InvalidFactor { .. })));
    }

    #[test]
    fn test_patterned_factor_turning_invalid_is_silent() {
        let factor = Value::Pattern(cat(nums(&[1.0, 0.0])).unwrap());
        let pattern = fast(factor, seq(nums(&[7.0])).unwrap()).unwrap();
        assert_eq!(pattern.query(&state(0.0, 1.0)).len(), 1);
        assert!(pattern.query(&state(1.0, 2.0)).is_empty());
    }

    #[test]
    fn test_empty_values_rejected() {
        assert_eq!(cat(vec![]).err(), Some(PatternError::empty("cat")));
        assert_eq!(seq(vec![]).err(), Some(PatternError::empty("seq")));
        assert_eq!(choose(vec![]).err(), Some(PatternError::empty("choose")));
        assert_eq!(stack(vec![]).err(), Some(PatternError::empty("stack")));
    }

    #[test]
    fn test_stack_shares_span() {
        let haps = stack(nums(&[1.0, 2.0])).unwrap().query(&state(0.0, 1.0));
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].span, TimeSpan::new(0.0, 1.0));
        assert_eq!(haps[0].span, haps[1].span);
    }

    #[test]
    fn test_choose_roughly_uniform() {
        let pattern = choose(vec![Value::from("a"), Value::from("b"), Value::from("c")]).unwrap();
        let st = state(0.0, 1.0);
        let mut counts = [0usize; 3];

        for k in 0..1000 {
            let haps = pattern.query_between(&st, k as f64, k as f64 + 1.0);
            assert_eq!(haps.len(), 1);
            match haps[0].value.as_string() {
                Some("a") => counts[0] += 1,
                Some("b") => counts[1] += 1,
                Some("c") => counts[2] += 1,
                other => panic!("unexpected value {:?}", other),
            }
        }

        for count in counts {
            assert!((250..420).contains(&count), "counts {:?}", counts);
        }
    }

    proptest! {
        #[test]
        fn prop_queries_are_referentially_transparent((from, to) in spans()) {
            let pattern = seq(vec![
                Value::from(1.0),
                Value::Pattern(seq(nums(&[2.0, 3.0])).unwrap()),
                Value::from(4.0),
            ]).unwrap().fast(3.0).unwrap();

            let first = pattern.query(&state(from, to));
            let second = pattern.query(&state(from, to));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_haps_overlap_query((from, to) in spans()) {
            let pattern = seq(nums(&[1.0, 2.0, 3.0])).unwrap().slow(1.5).unwrap();
            let query = TimeSpan::new(from, to);
            for hap in pattern.query(&state(from, to)) {
                prop_assert!(hap.span.overlaps(&query));
                prop_assert!(hap.from() <= hap.to());
            }
        }
    }
}
