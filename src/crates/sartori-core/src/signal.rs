//! Quantized waveform generators

use crate::combinators::seq;
use crate::error::{PatternError, Result};
use crate::pattern::{sample, sample_at};
use crate::{Hap, Pattern, State, Value};
use std::f64::consts::TAU;

/// Default number of steps per cycle
pub const DEFAULT_STEPS: f64 = 48.0;

/// Upper bound on steps per query, so a runaway `q` cannot stall a tick
const MAX_STEPS: f64 = 4096.0;

/// Noise lattice cells travelled per cycle
const NOISE_CELLS_PER_CYCLE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Saw,
    Sine,
    Cosine,
    Tri,
    Pulse,
    Square,
    Noise,
}

impl Waveform {
    pub fn from_name(name: &str) -> Option<Waveform> {
        Some(match name {
            "saw" | "range" | "ramp" => Waveform::Saw,
            "sine" => Waveform::Sine,
            "cosine" => Waveform::Cosine,
            "tri" => Waveform::Tri,
            "pulse" => Waveform::Pulse,
            "square" => Waveform::Square,
            "noise" => Waveform::Noise,
            _ => return None,
        })
    }

    /// Defaults for `(min, max, [duty], q)`
    fn defaults(self) -> Vec<f64> {
        match self {
            Waveform::Pulse => vec![0.0, 1.0, 0.5, DEFAULT_STEPS],
            _ => vec![0.0, 1.0, DEFAULT_STEPS],
        }
    }

    /// Shape in `[0, 1]` at `phase` in `[0, 1)`
    fn shape(self, phase: f64, duty: f64, noise: impl FnOnce() -> f64) -> f64 {
        match self {
            Waveform::Saw => phase,
            Waveform::Sine => (phase * TAU).sin() * 0.5 + 0.5,
            Waveform::Cosine => (phase * TAU).cos() * 0.5 + 0.5,
            Waveform::Tri => {
                if phase < 0.5 {
                    phase * 2.0
                } else {
                    1.0 - (phase - 0.5) * 2.0
                }
            }
            Waveform::Pulse | Waveform::Square => {
                if phase.rem_euclid(1.0) < duty {
                    1.0
                } else {
                    0.0
                }
            }
            Waveform::Noise => noise(),
        }
    }
}

/// Build a waveform pattern from `(min, max, [duty], q)`; missing trailing
/// arguments take their defaults and any of them may be a pattern.
pub fn waveform(kind: Waveform, args: Vec<Value>) -> Result<Pattern> {
    let defaults = kind.defaults();
    if args.len() > defaults.len() {
        return Err(PatternError::arity(
            format!("{:?}", kind).to_lowercase(),
            format!("at most {}", defaults.len()),
            args.len(),
        ));
    }

    let mut params: Vec<Value> = defaults.iter().map(|d| Value::from(*d)).collect();
    for (slot, arg) in params.iter_mut().zip(args) {
        *slot = arg;
    }

    Ok(Pattern::new(move |state| render(kind, &params, state)))
}

fn render(kind: Waveform, params: &[Value], state: &State) -> Vec<Hap> {
    let span = state.span;
    let q_param = &params[params.len() - 1];
    let steps = sample(q_param, state, span.begin, span.end)
        .as_number()
        .filter(|q| !q.is_nan())
        .unwrap_or(DEFAULT_STEPS)
        .floor()
        .min(MAX_STEPS);
    if !(steps >= 1.0) {
        return Vec::new();
    }
    let count = steps as usize;
    let cycle_start = span.begin.floor();

    let values: Vec<Value> = (0..count)
        .map(|i| {
            let phase = i as f64 / steps;
            let t = span.lerp(phase);
            let number = |index: usize, default: f64| {
                sample_at(&params[index], state, t).as_number().unwrap_or(default)
            };
            let min = number(0, 0.0);
            let max = number(1, 1.0);
            let duty = match kind {
                Waveform::Pulse => number(2, 0.5),
                _ => 0.5,
            };
            let position = (cycle_start + phase) * NOISE_CELLS_PER_CYCLE;
            let level = kind.shape(phase, duty, || state.random.noise(position));
            Value::Number(min + (max - min) * level)
        })
        .collect();

    seq(values).map(|p| p.query(state)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::cat;
    use crate::testing::{numbers, state};

    fn wave(kind: Waveform, args: &[f64]) -> Pattern {
        waveform(kind, args.iter().map(|v| Value::from(*v)).collect()).unwrap()
    }

    #[test]
    fn test_saw_steps() {
        let haps = wave(Waveform::Saw, &[0.0, 4.0, 4.0]).query(&state(0.0, 1.0));
        assert_eq!(numbers(&haps), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(haps[1].span.begin, 0.25);
    }

    #[test]
    fn test_default_resolution() {
        let haps = wave(Waveform::Sine, &[]).query(&state(0.0, 1.0));
        assert_eq!(haps.len(), 48);
        assert!((haps[0].value.as_number().unwrap() - 0.5).abs() < 1e-9);
        assert!((haps[12].value.as_number().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_and_tri() {
        let cos = numbers(&wave(Waveform::Cosine, &[0.0, 1.0, 4.0]).query(&state(0.0, 1.0)));
        let expected = [1.0, 0.5, 0.0, 0.5];
        for (a, b) in cos.iter().zip(expected) {
            assert!((a - b).abs() < 1e-9);
        }

        let tri = numbers(&wave(Waveform::Tri, &[0.0, 1.0, 4.0]).query(&state(0.0, 1.0)));
        assert_eq!(tri, vec![0.0, 0.5, 1.0, 0.5]);
    }

    #[test]
    fn test_pulse_duty() {
        let pulse = numbers(&wave(Waveform::Pulse, &[0.0, 1.0, 0.25, 4.0]).query(&state(0.0, 1.0)));
        assert_eq!(pulse, vec![1.0, 0.0, 0.0, 0.0]);

        let square = numbers(&wave(Waveform::Square, &[0.0, 4.0, 4.0]).query(&state(0.0, 1.0)));
        assert_eq!(square, vec![4.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_nan_resolution_uses_default() {
        let haps = wave(Waveform::Saw, &[0.0, 1.0, f64::NAN]).query(&state(0.0, 1.0));
        assert_eq!(haps.len(), 48);
        assert_eq!(wave(Waveform::Saw, &[0.0, 1.0, 0.5]).query(&state(0.0, 1.0)).len(), 0);
    }

    #[test]
    fn test_patterned_resolution() {
        let q = Value::Pattern(cat(vec![Value::from(2.0), Value::from(8.0)]).unwrap());
        let pattern = waveform(Waveform::Saw, vec![Value::from(0.0), Value::from(1.0), q]).unwrap();
        assert_eq!(pattern.query(&state(0.0, 1.0)).len(), 2);
        assert_eq!(pattern.query(&state(1.0, 2.0)).len(), 8);
    }

    #[test]
    fn test_noise_bounded_and_seeded() {
        let pattern = wave(Waveform::Noise, &[5.0, 10.0]);
        let first = numbers(&pattern.query(&state(0.0, 1.0)));
        let again = numbers(&pattern.query(&state(0.0, 1.0)));

        assert_eq!(first.len(), 48);
        assert!(first.iter().all(|v| (5.0..=10.0).contains(v)));
        assert_eq!(first, again);
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec![Value::from(0.0); 4];
        assert!(waveform(Waveform::Saw, args).is_err());
    }
}
