//! Futures aware circuit breaker.
//!
//! # Example
//!
//! ```
//! # async fn example() {
//! use sqlbreaker::futures::BreakerExt;
//! use sqlbreaker::{CircuitBreaker, Error};
//!
//! async fn fetch_user(id: u64) -> Result<String, std::io::Error> {
//!     Ok(format!("user {}", id))
//! }
//!
//! let breaker = CircuitBreaker::default();
//!
//! match breaker.call_async(fetch_user(1)).await {
//!     Ok(user) => println!("{}", user),
//!     Err(Error::Inner(err)) => eprintln!("query failed: {}", err),
//!     Err(Error::Rejected) => eprintln!("database unavailable"),
//! }
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::future::TryFuture;
use pin_project_lite::pin_project;

use super::breaker::Breaker;
use super::error::Error;
use super::failure_predicate::{self, FailurePredicate};
use super::promise::Promise;

/// Runs futures within a breaker.
pub trait BreakerExt: Breaker + Clone + Sized {
    /// Executes a given future within circuit breaker.
    ///
    /// Depending on future result value, the call will be recorded as success or failure.
    #[inline]
    fn call_async<F>(&self, f: F) -> ResultFuture<F, Self, Self::Promise, failure_predicate::Any>
    where
        F: TryFuture,
        F::Error: Display,
    {
        self.call_async_with(failure_predicate::Any, f)
    }

    /// Executes a given future within circuit breaker.
    ///
    /// Depending on future result value, the call will be recorded as success or failure.
    /// It also checks error by the provided predicate. If the predicate returns `true` for the
    /// error, the call is recorded as failure otherwise considered this error as a success.
    #[inline]
    fn call_async_with<F, P>(&self, predicate: P, f: F) -> ResultFuture<F, Self, Self::Promise, P>
    where
        F: TryFuture,
        F::Error: Display,
        P: FailurePredicate<F::Error>,
    {
        ResultFuture {
            future: f,
            breaker: self.clone(),
            predicate,
            promise: None,
            asked: false,
        }
    }
}

impl<B> BreakerExt for B where B: Breaker + Clone {}

pin_project! {
    /// A future guarded by a breaker.
    ///
    /// Admission is requested on the first poll. The outcome is recorded when the inner
    /// future completes; dropping it earlier records nothing.
    #[derive(Debug)]
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct ResultFuture<FUT, B, PROMISE, P> {
        #[pin]
        future: FUT,
        breaker: B,
        predicate: P,
        promise: Option<PROMISE>,
        asked: bool,
    }
}

impl<FUT, B, PROMISE, P> Future for ResultFuture<FUT, B, PROMISE, P>
where
    FUT: TryFuture,
    FUT::Error: Display,
    B: Breaker<Promise = PROMISE>,
    PROMISE: Promise,
    P: FailurePredicate<FUT::Error>,
{
    type Output = Result<FUT::Ok, Error<FUT::Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if !*this.asked {
            *this.asked = true;
            *this.promise = Some(this.breaker.allow()?);
        }

        match this.future.try_poll(cx) {
            Poll::Ready(Ok(ok)) => {
                if let Some(promise) = this.promise.take() {
                    promise.accept();
                }
                Poll::Ready(Ok(ok))
            }
            Poll::Ready(Err(err)) => {
                if let Some(promise) = this.promise.take() {
                    if this.predicate.is_err(&err) {
                        promise.reject(&err.to_string());
                    } else {
                        promise.accept();
                    }
                }
                Poll::Ready(Err(Error::Inner(err)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
