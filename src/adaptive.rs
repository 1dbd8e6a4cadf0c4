//! Adaptive throttling as described in the "Handling Overload" chapter of the Google SRE
//! book.
//!
//! There are no explicit closed, open and half open states. Every admission check reads
//! the trailing window and rejects with probability
//!
//! ```text
//! max(0, (total - k * accepts) / (total + 1))
//! ```
//!
//! so the breaker gradually opens as failures pile up and closes again as they slide out
//! of the window or get outweighed by successes.

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;

use super::error::ServiceUnavailable;
use super::proba::Proba;
use super::rolling_window::RollingWindow;

/// The admission algorithm.
#[derive(Debug)]
pub struct AdaptiveBreaker<R = StdRng> {
    stat: Mutex<RollingWindow>,
    k: f64,
    request_threshold: u64,
    proba: Proba<R>,
}

/// The outcome handle returned by [`AdaptiveBreaker::allow`].
#[derive(Debug)]
#[must_use = "the outcome of an admitted call should be reported"]
pub struct AdaptivePromise<'a, R> {
    breaker: &'a AdaptiveBreaker<R>,
}

impl AdaptiveBreaker<StdRng> {
    /// Creates a breaker with an entropy-seeded sampler.
    ///
    /// * `window` - The statistics window the decisions are made on.
    /// * `k` - The tolerance multiplier; rejection starts once `total >= k * accepts`.
    /// * `request_threshold` - The minimum number of requests in the window before any
    ///   call is rejected.
    ///
    /// # Panics
    ///
    /// When `k` isn't a finite positive number.
    pub fn new(window: RollingWindow, k: f64, request_threshold: u64) -> Self {
        Self::with_proba(window, k, request_threshold, Proba::new())
    }
}

impl<R> AdaptiveBreaker<R>
where
    R: Rng,
{
    /// Creates a breaker drawing its decisions from the given sampler.
    ///
    /// # Panics
    ///
    /// When `k` isn't a finite positive number.
    pub fn with_proba(
        window: RollingWindow,
        k: f64,
        request_threshold: u64,
        proba: Proba<R>,
    ) -> Self {
        assert!(k.is_finite() && k > 0.0, "k must be a finite positive number");

        Self {
            stat: Mutex::new(window),
            k,
            request_threshold,
            proba,
        }
    }

    /// Checks whether a call may proceed without handing out an outcome handle.
    ///
    /// The caller is expected to report the outcome through [`mark_success`] or
    /// [`mark_failure`].
    ///
    /// [`mark_success`]: AdaptiveBreaker::mark_success
    /// [`mark_failure`]: AdaptiveBreaker::mark_failure
    pub fn accept(&self) -> Result<(), ServiceUnavailable> {
        let (accepts, total) = self.history();
        let drop_ratio = self.drop_ratio_of(accepts, total);

        if drop_ratio > 0.0 && self.proba.true_on_proba(drop_ratio) {
            tracing::trace!(drop_ratio, accepts, total, "adaptive breaker dropped a call");
            return Err(ServiceUnavailable);
        }

        Ok(())
    }

    /// Checks whether a call may proceed.
    ///
    /// On admission the returned handle must be told the outcome of the call.
    pub fn allow(&self) -> Result<AdaptivePromise<'_, R>, ServiceUnavailable> {
        self.accept()?;
        Ok(AdaptivePromise { breaker: self })
    }

    /// Returns the probability that the next check is rejected.
    pub fn drop_ratio(&self) -> f64 {
        let (accepts, total) = self.history();
        self.drop_ratio_of(accepts, total)
    }

    fn drop_ratio_of(&self, accepts: u64, total: u64) -> f64 {
        let weighted_accepts = self.k * accepts as f64;
        let total = total as f64;

        if total < self.request_threshold as f64 || total < weighted_accepts {
            return 0.0;
        }

        ((total - weighted_accepts) / (total + 1.0)).max(0.0)
    }
}

impl<R> AdaptiveBreaker<R> {
    /// Records a successful call.
    pub fn mark_success(&self) {
        self.stat.lock().add(true);
    }

    /// Records a failed call.
    pub fn mark_failure(&self) {
        self.stat.lock().add(false);
    }

    /// Returns `(accepts, total)` over the trailing window.
    pub fn history(&self) -> (u64, u64) {
        self.stat.lock().aggregate()
    }

    /// Returns the time covered by the trailing window.
    pub fn window(&self) -> Duration {
        let stat = self.stat.lock();
        let buckets = u32::try_from(stat.size()).unwrap_or(u32::MAX);
        stat.interval().saturating_mul(buckets)
    }
}

impl<'a, R> AdaptivePromise<'a, R> {
    /// Records the call as successful.
    pub fn accept(self) {
        self.breaker.mark_success();
    }

    /// Records the call as failed.
    pub fn reject(self) {
        self.breaker.mark_failure();
    }
}
