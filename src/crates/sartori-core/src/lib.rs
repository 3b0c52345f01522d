//! Core types for the Sartori pattern language
//!
//! A [`Pattern`] is a pure function from a queried span of cycles to the
//! [`Hap`]s overlapping it. This crate holds the pattern model and every
//! combinator built on it: sequencing, time warps, arithmetic over values,
//! waveforms, randomness, stateful triggers and the Euclidean rhythm
//! generator. Parsing mini-notation lives in `sartori-mini`.
//!
//! # Examples
//!
//! ```
//! use sartori_core::{seq, RandomSource, State, TimeSpan, Value};
//!
//! let pattern = seq(vec![Value::from("bd"), Value::from("sd")]).unwrap();
//! let state = State::with_random(TimeSpan::new(0.0, 1.0), RandomSource::seeded(1));
//!
//! let haps = pattern.query(&state);
//! assert_eq!(haps.len(), 2);
//! assert_eq!(haps[1].span, TimeSpan::new(0.5, 1.0));
//! ```
//!
//! # Main Components
//!
//! - **Pattern**: the queryable pattern type
//! - **Value**: what a hap carries (numbers, strings, chords, nested patterns)
//! - **State**: the query context (span, controls, random source)
//! - **library**: name-based dispatch used by the script interpreter
//! - **Event**: the serializable output of a compiled stream

pub mod combinators;
pub mod control;
pub mod error;
pub mod euclid;
pub mod event;
pub mod hap;
pub mod library;
pub mod math;
pub mod ops;
pub mod pattern;
pub mod probability;
pub mod random;
pub mod signal;
pub mod state;
pub mod timespan;
pub mod value;

#[cfg(test)]
mod testing;

pub use combinators::{cat, choose, cycle, fast, pure, seq, set, silence, slow, stack, wrap};
pub use error::{PatternError, Result};
pub use event::{Compiled, Event, EventKind, TempoChange};
pub use hap::Hap;
pub use pattern::{sample, sample_at, sample_number, Pattern};
pub use random::RandomSource;
pub use state::{State, CPS};
pub use timespan::{TimeSpan, EPSILON};
pub use value::Value;
