//! Process-wide random source
//!
//! Every die roll and every probabilistic decision goes through one seeded
//! generator. Each helper holds the lock for a single draw only, so
//! concurrent duels contend as little as possible.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::combat::constants::{CRITICAL_ROLL, DIE_FACES};
use crate::core::config::config;

/// Seed used when the configuration does not name one
pub const DEFAULT_SEED: u64 = 5489;

static RNG: OnceLock<Mutex<ChaCha8Rng>> = OnceLock::new();

fn lock() -> MutexGuard<'static, ChaCha8Rng> {
    RNG.get_or_init(|| {
        let seed = config().rng_seed.unwrap_or(DEFAULT_SEED);
        Mutex::new(ChaCha8Rng::seed_from_u64(seed))
    })
    .lock()
    .unwrap_or_else(PoisonError::into_inner)
}

/// Restart the global sequence from `seed`
pub fn reseed(seed: u64) {
    *lock() = ChaCha8Rng::seed_from_u64(seed);
}

/// Roll a six-sided die where a natural 6 counts as a critical 8
pub fn d6_with_crit() -> i32 {
    let roll = lock().gen_range(1..=DIE_FACES);
    if roll == DIE_FACES {
        CRITICAL_ROLL
    } else {
        roll
    }
}

/// Uniform sample in [0, 1)
pub fn uniform() -> f64 {
    lock().gen::<f64>()
}

/// Pick an index with probability proportional to its weight
///
/// Returns None when the weights cannot form a distribution (empty, all
/// zero, negative or NaN).
pub fn sample_weighted(weights: &[f64]) -> Option<usize> {
    let distribution = WeightedIndex::new(weights).ok()?;
    let index = distribution.sample(&mut *lock());
    Some(index)
}
