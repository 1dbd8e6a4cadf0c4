/// The outcome handle of an admitted call.
///
/// Returned by [`Breaker::allow`](crate::Breaker::allow). Exactly one of the methods
/// consumes the handle, so an outcome can not be reported twice. Dropping a handle
/// without reporting leaves the call out of the statistics.
pub trait Promise {
    /// Tells the breaker that the call succeeded.
    fn accept(self);

    /// Tells the breaker that the call failed because of `reason`.
    fn reject(self, reason: &str);
}
