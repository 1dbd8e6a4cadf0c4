use super::breaker::Breaker;
use super::error::ServiceUnavailable;
use super::promise::Promise;

/// The name every [`NoopBreaker`] reports.
pub const NOOP_BREAKER_NAME: &str = "nopBreaker";

/// A breaker which admits every call. Used where circuit breaking is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBreaker;

/// A promise which ignores the reported outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopPromise;

impl Breaker for NoopBreaker {
    type Promise = NopPromise;

    #[inline]
    fn name(&self) -> &str {
        NOOP_BREAKER_NAME
    }

    #[inline]
    fn allow(&self) -> Result<NopPromise, ServiceUnavailable> {
        Ok(NopPromise)
    }
}

impl Promise for NopPromise {
    #[inline]
    fn accept(self) {}

    #[inline]
    fn reject(self, _reason: &str) {}
}
