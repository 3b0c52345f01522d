//! Euclidean rhythms
//!
//! Pulses are spread as evenly as possible across the steps by repeatedly
//! interleaving the pulse groups with the remainder groups, as in Bjorklund's
//! construction.

use crate::error::{PatternError, Result};

/// Longest rhythm `euclid` will build
pub const MAX_STEPS: i64 = 1024;

/// Generate a Euclidean rhythm where `true` is a pulse and `false` a rest
///
/// # Examples
/// ```
/// use sartori_core::euclid::euclid;
///
/// let rhythm: String = euclid(3, 8)
///     .unwrap()
///     .into_iter()
///     .map(|pulse| if pulse { '1' } else { '0' })
///     .collect();
/// assert_eq!(rhythm, "10010010");
/// ```
pub fn euclid(pulses: i64, steps: i64) -> Result<Vec<bool>> {
    if pulses < 0 || steps < pulses || steps > MAX_STEPS {
        return Err(PatternError::InvalidEuclid { pulses, steps });
    }
    let pulses = pulses as usize;
    let steps = steps as usize;

    let mut front: Vec<Vec<bool>> = vec![vec![true]; pulses];
    let mut back: Vec<Vec<bool>> = vec![vec![false]; steps - pulses];

    // The first pass runs whenever there is anything to pair; later passes
    // stop once the remainder is down to a single group.
    let mut threshold = 0;
    let mut shortest = front.len().min(back.len());
    while shortest > threshold {
        threshold = 1;

        for (group, tail) in front.iter_mut().zip(&back) {
            group.extend_from_slice(tail);
        }

        if shortest == front.len() {
            back.drain(..shortest);
        } else {
            back = front.split_off(shortest);
        }
        shortest = front.len().min(back.len());
    }

    Ok(front.into_iter().chain(back).flatten().collect())
}
