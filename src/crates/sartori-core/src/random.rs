//! The injected random source shared by every randomized combinator

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;

/// A seedable random stream threaded through pattern queries.
///
/// Clones share the same underlying generator, so every sub-query made on
/// behalf of one top-level query draws from a single sequence.
#[derive(Clone)]
pub struct RandomSource {
    seed: u64,
    rng: Arc<Mutex<StdRng>>,
}

impl RandomSource {
    /// Create a deterministic source from a seed
    pub fn seeded(seed: u64) -> Self {
        RandomSource {
            seed,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Create a source seeded from system entropy
    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }

    /// The seed this source was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform sample in `[0, 1)`
    pub fn next_f64(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&self, len: usize) -> usize {
        self.rng.lock().gen_range(0..len)
    }

    /// Smooth value noise in `[0, 1]` at position `x`, keyed by the seed.
    ///
    /// Unlike the other samplers this does not advance the generator, so the
    /// same position always yields the same value for a given seed.
    pub fn noise(&self, x: f64) -> f64 {
        let cell = x.floor();
        let t = x - cell;
        let a = lattice(self.seed, cell as i64);
        let b = lattice(self.seed, cell as i64 + 1);
        let eased = t * t * (3.0 - 2.0 * t);
        a + (b - a) * eased
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSource").field("seed", &self.seed).finish()
    }
}

// splitmix64 finaliser over (seed, index)
fn lattice(seed: u64, index: i64) -> f64 {
    let mut z = seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}
