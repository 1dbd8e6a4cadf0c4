/// Evaluates if an error should be recorded as a failure and thus raise the drop ratio.
pub trait FailurePredicate<E> {
    /// Must return `true` if the error should count as a failure, otherwise it must return `false`.
    fn is_err(&self, err: &E) -> bool;
}

impl<E, F> FailurePredicate<E> for F
where
    F: Fn(&E) -> bool,
{
    #[inline]
    fn is_err(&self, err: &E) -> bool {
        self(err)
    }
}

/// Classifies every error as a failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct Any;

impl<E> FailurePredicate<E> for Any {
    #[inline]
    fn is_err(&self, _err: &E) -> bool {
        true
    }
}
