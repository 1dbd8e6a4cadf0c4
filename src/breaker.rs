use std::fmt::Display;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use super::adaptive::AdaptiveBreaker;
use super::clock;
use super::config::Config;
use super::error::{Error, ServiceUnavailable};
use super::error_window::ErrorWindow;
use super::failure_predicate::{self, FailurePredicate};
use super::promise::Promise;
use super::proba::Proba;
use super::rolling_window::RollingWindow;

/// A circuit breaker's public interface.
pub trait Breaker {
    /// The outcome handle of an admitted call.
    type Promise: Promise;

    /// Returns the name of the breaker.
    fn name(&self) -> &str;

    /// Requests permission to call the dependency.
    ///
    /// If allowed, the caller must report the outcome of the call through the returned
    /// promise. Otherwise `ServiceUnavailable` is returned and the dependency must not
    /// be called.
    fn allow(&self) -> Result<Self::Promise, ServiceUnavailable>;

    /// Executes a given function within circuit breaker.
    ///
    /// Depending on function result value, the call will be recorded as success or failure.
    #[inline]
    fn call<F, E, R>(&self, f: F) -> Result<R, Error<E>>
    where
        F: FnOnce() -> Result<R, E>,
        E: Display,
    {
        self.call_with(failure_predicate::Any, f)
    }

    /// Executes a given function within circuit breaker.
    ///
    /// Depending on function result value, the call will be recorded as success or failure.
    /// It also checks error by the provided predicate. If the predicate returns `true` for the
    /// error, the call is recorded as failure otherwise considered this error as a success.
    fn call_with<P, F, E, R>(&self, predicate: P, f: F) -> Result<R, Error<E>>
    where
        P: FailurePredicate<E>,
        F: FnOnce() -> Result<R, E>,
        E: Display,
    {
        let promise = self.allow()?;

        match f() {
            Ok(ok) => {
                promise.accept();
                Ok(ok)
            }
            Err(err) => {
                if predicate.is_err(&err) {
                    promise.reject(&err.to_string());
                } else {
                    promise.accept();
                }
                Err(Error::Inner(err))
            }
        }
    }
}

#[derive(Debug)]
struct Inner {
    name: String,
    breaker: AdaptiveBreaker,
    errors: ErrorWindow,
}

/// An adaptive circuit breaker.
///
/// Clones share the same statistics, so a single breaker can guard a dependency that is
/// called from many threads.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    inner: Arc<Inner>,
}

/// The outcome handle returned by [`CircuitBreaker`].
///
/// Failures are recorded into the statistics window and their reasons into the
/// breaker's error log.
#[derive(Debug)]
#[must_use = "the outcome of an admitted call should be reported"]
pub struct ReasonPromise {
    inner: Arc<Inner>,
}

impl CircuitBreaker {
    /// Returns a circuit breaker's builder.
    pub fn builder() -> Config {
        Config::new()
    }

    pub(crate) fn new(config: Config) -> Self {
        let name = config.name.unwrap_or_else(default_name);
        let window = RollingWindow::new(config.buckets, config.bucket_duration);
        let proba = match config.seed {
            Some(seed) => Proba::seeded(seed),
            None => Proba::new(),
        };

        let breaker =
            AdaptiveBreaker::with_proba(window, config.k, config.request_threshold, proba);

        Self {
            inner: Arc::new(Inner {
                name,
                breaker,
                errors: ErrorWindow::new(config.history_capacity),
            }),
        }
    }

    /// Returns `(accepts, total)` over the trailing window.
    pub fn history(&self) -> (u64, u64) {
        self.inner.breaker.history()
    }

    /// Returns the recent failure reasons, most recent first, one per line.
    pub fn recent_errors(&self) -> String {
        self.inner.errors.to_string()
    }

    /// Returns the probability that the next call is rejected.
    pub fn drop_ratio(&self) -> f64 {
        self.inner.breaker.drop_ratio()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        CircuitBreaker::builder().build()
    }
}

impl Breaker for CircuitBreaker {
    type Promise = ReasonPromise;

    #[inline]
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn allow(&self) -> Result<ReasonPromise, ServiceUnavailable> {
        if let Err(err) = self.inner.breaker.accept() {
            tracing::debug!(breaker = %self.inner.name, "call rejected");
            return Err(err);
        }

        Ok(ReasonPromise {
            inner: self.inner.clone(),
        })
    }
}

impl Promise for ReasonPromise {
    #[inline]
    fn accept(self) {
        self.inner.breaker.mark_success();
    }

    fn reject(self, reason: &str) {
        tracing::debug!(breaker = %self.inner.name, reason, "call failed");
        self.inner.errors.add(reason);
        self.inner.breaker.mark_failure();
    }
}

fn default_name() -> String {
    clock::system_now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
        .to_string()
}
