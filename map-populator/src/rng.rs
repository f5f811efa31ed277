use chrono::Utc;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Exclusive upper bound of drawn values. The sign bit stays clear.
pub const VALUE_BOUND: u32 = 1 << 31;

/// Pseudo-random source of map values.
///
/// Owns the only RNG state in the process and is passed by `&mut` to whoever
/// needs values. Not suitable for anything security related.
pub struct ValueSource {
    rng: SmallRng,
    seed: u64,
}

impl ValueSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seeds from the wall clock, nanosecond resolution.
    pub fn from_clock() -> Self {
        let now = Utc::now();
        // Out of range only after the year 2262; fall back to seconds.
        let stamp = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp());
        Self::from_seed(clock_seed(stamp))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform over `[0, 2^31)`.
    pub fn next_u32(&mut self) -> u32 {
        self.rng.random_range(0..VALUE_BOUND)
    }
}

/// Magnitude of a clock reading; a clock set before 1970 reads negative.
fn clock_seed(stamp: i64) -> u64 {
    stamp.unsigned_abs()
}
