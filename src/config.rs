use std::time::Duration;

use super::breaker::CircuitBreaker;

/// The default number of buckets in the statistics window.
pub const DEFAULT_BUCKETS: usize = 10;
/// The default time covered by a single bucket.
pub const DEFAULT_BUCKET_DURATION: Duration = Duration::from_secs(1);
/// The default tolerance multiplier.
pub const DEFAULT_K: f64 = 5.0;
/// The default minimum number of requests in the window before anything is rejected.
pub const DEFAULT_REQUEST_THRESHOLD: u64 = 100;
/// The default number of failure reasons kept for diagnostics.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// A `CircuitBreaker`'s configuration.
///
/// ```
/// use std::time::Duration;
///
/// use sqlbreaker::{Breaker, Config};
///
/// let breaker = Config::new()
///     .name("orders-db")
///     .bucket_duration(Duration::from_millis(250))
///     .build();
///
/// assert_eq!("orders-db", breaker.name());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) name: Option<String>,
    pub(crate) buckets: usize,
    pub(crate) bucket_duration: Duration,
    pub(crate) k: f64,
    pub(crate) request_threshold: u64,
    pub(crate) history_capacity: usize,
    pub(crate) seed: Option<u64>,
}

impl Config {
    /// Creates a new circuit breaker's default configuration.
    pub fn new() -> Self {
        Config {
            name: None,
            buckets: DEFAULT_BUCKETS,
            bucket_duration: DEFAULT_BUCKET_DURATION,
            k: DEFAULT_K,
            request_threshold: DEFAULT_REQUEST_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            seed: None,
        }
    }

    /// Sets the breaker's name. Unnamed breakers are named after their creation time.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the number of buckets in the statistics window.
    pub fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    /// Sets the time covered by a single bucket.
    pub fn bucket_duration(mut self, bucket_duration: Duration) -> Self {
        self.bucket_duration = bucket_duration;
        self
    }

    /// Sets the tolerance multiplier. Lower values reject earlier.
    pub fn k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    /// Sets the minimum number of requests in the window before anything is rejected.
    pub fn request_threshold(mut self, request_threshold: u64) -> Self {
        self.request_threshold = request_threshold;
        self
    }

    /// Sets how many failure reasons are kept for diagnostics.
    pub fn history_capacity(mut self, history_capacity: usize) -> Self {
        self.history_capacity = history_capacity;
        self
    }

    /// Seeds the sampler, making rejection decisions repeatable.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the time covered by the statistics window.
    pub fn window(&self) -> Duration {
        let buckets = u32::try_from(self.buckets).unwrap_or(u32::MAX);
        self.bucket_duration.saturating_mul(buckets)
    }

    /// Builds a new circuit breaker instance.
    ///
    /// # Panics
    ///
    /// * When `buckets`, `bucket_duration` or `history_capacity` is zero.
    /// * When `k` isn't a finite positive number.
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
