use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws booleans that are `true` with a given probability.
#[derive(Debug)]
pub struct Proba<R = StdRng> {
    rng: Mutex<R>,
}

impl Proba<StdRng> {
    /// Creates a sampler seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a sampler with a deterministic sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Proba<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Proba<R>
where
    R: Rng,
{
    /// Creates a sampler on top of the given generator.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Returns `true` with probability `proba`.
    ///
    /// Values at or below 0 never fire, values at or above 1 always do.
    pub fn true_on_proba(&self, proba: f64) -> bool {
        self.rng.lock().gen::<f64>() < proba
    }
}
