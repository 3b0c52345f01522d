//! Random triggers drawn from the query's random source

use crate::combinators::cycle;
use crate::pattern::sample;
use crate::{Hap, Pattern, Value};

/// One Bernoulli sample per cycle: 1 with probability `probability`, else 0
pub fn weighted_coin(probability: Value) -> Pattern {
    cycle(move |_, state| {
        let span = state.span;
        let p = sample(&probability, state, span.begin, span.end)
            .as_number()
            .unwrap_or(0.5);
        let hit = state.random.next_f64() < p;
        vec![Hap::new(span, Value::Number(if hit { 1.0 } else { 0.0 }))]
    })
}

/// Even odds
pub fn coin() -> Pattern {
    weighted_coin(Value::Number(0.5))
}

/// Alias for [`coin`]
pub fn sometimes() -> Pattern {
    coin()
}

/// Mostly 0, occasionally 1
pub fn rarely() -> Pattern {
    weighted_coin(Value::Number(0.25))
}

/// Mostly 1, occasionally 0
pub fn often() -> Pattern {
    weighted_coin(Value::Number(0.75))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::state;

    fn hit_rate(pattern: &Pattern) -> f64 {
        let st = state(0.0, 1.0);
        let hits: f64 = (0..2000)
            .map(|k| pattern.query_between(&st, k as f64, k as f64 + 1.0)[0].value.as_number().unwrap())
            .sum();
        hits / 2000.0
    }

    #[test]
    fn test_fixed_probabilities() {
        assert!((hit_rate(&coin()) - 0.5).abs() < 0.06);
        assert!((hit_rate(&rarely()) - 0.25).abs() < 0.06);
        assert!((hit_rate(&often()) - 0.75).abs() < 0.06);
    }

    #[test]
    fn test_certain_outcomes() {
        assert_eq!(hit_rate(&weighted_coin(Value::from(1.0))), 1.0);
        assert_eq!(hit_rate(&weighted_coin(Value::from(0.0))), 0.0);
    }

    #[test]
    fn test_one_sample_per_cycle() {
        let haps = coin().query(&state(0.0, 3.0));
        assert_eq!(haps.len(), 3);
        assert_eq!(haps[2].span.begin, 2.0);
    }
}
