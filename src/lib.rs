//! An adaptive circuit breaker for database driver calls.
//!
//! The breaker sits in front of a dependency, keeps the outcomes of recent calls in a
//! rolling time window and rejects new calls with a probability that grows with the
//! observed failure rate (see the "Handling Overload" chapter of the Google SRE book).
//! There is no open/closed state machine: the breaker opens gradually while failures
//! accumulate and recovers as they slide out of the window.
//!
//! # Example
//!
//! ```
//! use sqlbreaker::{Breaker, Config, Promise};
//!
//! let breaker = Config::new().name("orders-db").build();
//!
//! match breaker.allow() {
//!     Ok(promise) => match run_query() {
//!         Ok(_) => promise.accept(),
//!         Err(err) => promise.reject(&err),
//!     },
//!     Err(err) => eprintln!("{}: {}", breaker.name(), err),
//! }
//! # fn run_query() -> Result<(), String> { Ok(()) }
//! ```

#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

mod adaptive;
mod breaker;
mod config;
mod error;
mod error_window;
mod failure_predicate;
mod noop;
mod promise;
mod proba;
mod registry;
mod rolling_window;

pub mod clock;
pub mod hook;

#[cfg(feature = "futures-support")]
pub mod futures;

pub use self::adaptive::{AdaptiveBreaker, AdaptivePromise};
pub use self::breaker::{Breaker, CircuitBreaker, ReasonPromise};
pub use self::config::{
    Config, DEFAULT_BUCKETS, DEFAULT_BUCKET_DURATION, DEFAULT_HISTORY_CAPACITY, DEFAULT_K,
    DEFAULT_REQUEST_THRESHOLD,
};
pub use self::error::{Error, ServiceUnavailable};
pub use self::error_window::ErrorWindow;
pub use self::failure_predicate::{Any, FailurePredicate};
pub use self::noop::{NoopBreaker, NopPromise, NOOP_BREAKER_NAME};
pub use self::promise::Promise;
pub use self::proba::Proba;
pub use self::registry::Registry;
pub use self::rolling_window::{Bucket, RollingWindow};
