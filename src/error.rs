use thiserror::Error;

/// The breaker refused to admit a call.
///
/// The dependency looks unhealthy. Callers should fail fast or fall back instead of
/// retrying against the same breaker right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("circuit breaker is open")]
pub struct ServiceUnavailable;

/// An error of a call made through a breaker.
#[derive(Debug, PartialEq, Error)]
pub enum Error<E> {
    /// An error from inner call.
    #[error("{0}")]
    Inner(#[source] E),
    /// The call was rejected without reaching the dependency.
    #[error("circuit breaker is open")]
    Rejected,
}

impl<E> Error<E> {
    /// Returns `true` if the call was rejected by the breaker.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Error::Rejected)
    }

    /// Returns the inner error, if the call went through and failed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Error::Inner(err) => Some(err),
            Error::Rejected => None,
        }
    }
}

impl<E> From<ServiceUnavailable> for Error<E> {
    fn from(_: ServiceUnavailable) -> Self {
        Error::Rejected
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::io;

    use super::*;

    #[test]
    fn display() {
        assert_eq!("circuit breaker is open", ServiceUnavailable.to_string());
        assert_eq!(
            "circuit breaker is open",
            Error::<io::Error>::Rejected.to_string()
        );

        let err = Error::Inner(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!("boom", err.to_string());
        assert!(err.source().is_some());
    }

    #[test]
    fn rejected_from_service_unavailable() {
        let err: Error<()> = ServiceUnavailable.into();
        assert!(err.is_rejected());
        assert_eq!(None, err.into_inner());
        assert_eq!(Some(3), Error::Inner(3).into_inner());
    }
}
