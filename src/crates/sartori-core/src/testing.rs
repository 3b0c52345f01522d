//! Shared helpers for unit tests

use crate::{Hap, RandomSource, State, TimeSpan};
use proptest::prelude::*;

/// A seeded state over `[from, to)`
pub fn state(from: f64, to: f64) -> State {
    State::with_random(TimeSpan::new(from, to), RandomSource::seeded(0))
}

/// The numeric values of `haps`, in order
pub fn numbers(haps: &[Hap]) -> Vec<f64> {
    haps.iter()
        .map(|hap| hap.value.as_number().unwrap_or(f64::NAN))
        .collect()
}

/// Non-empty query spans within the first few cycles, either side of zero
pub fn spans() -> impl Strategy<Value = (f64, f64)> {
    (-8.0f64..8.0, 0.001f64..3.0).prop_map(|(from, width)| (from, from + width))
}
