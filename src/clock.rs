//! Time source used by the breaker.
//!
//! Outside of tests this is simply `Instant::now()` and `SystemTime::now()`. Inside
//! [`freeze`] the time of the current thread stands still until it is advanced
//! explicitly, which makes bucket rotation testable without sleeping.

use std::cell::RefCell;
use std::time::{Duration, Instant, SystemTime};

thread_local!(static CLOCK: RefCell<Option<Frozen>> = RefCell::new(None));

#[derive(Debug, Clone, Copy)]
struct Frozen {
    instant: Instant,
    system: SystemTime,
}

/// A handle to the frozen time of the current thread.
#[derive(Debug)]
pub struct MockClock {
    _private: (),
}

impl MockClock {
    /// Returns the frozen monotonic time.
    pub fn now(&self) -> Instant {
        now()
    }

    /// Moves the frozen time forward by `diff`.
    pub fn advance(&mut self, diff: Duration) {
        CLOCK.with(|cell| {
            if let Some(frozen) = cell.borrow_mut().as_mut() {
                frozen.instant += diff;
                frozen.system += diff;
            }
        })
    }
}

/// Freezes the time of the current thread for the duration of `f`.
///
/// # Panics
///
/// When the clock of the current thread is already frozen.
pub fn freeze<F, R>(f: F) -> R
where
    F: FnOnce(&mut MockClock) -> R,
{
    CLOCK.with(|cell| {
        let mut current = cell.borrow_mut();
        assert!(
            current.is_none(),
            "clock already frozen for execution context"
        );
        *current = Some(Frozen {
            instant: Instant::now(),
            system: SystemTime::now(),
        });
    });

    // Unfreezes on the way out, panics included.
    struct Reset;

    impl Drop for Reset {
        fn drop(&mut self) {
            CLOCK.with(|cell| *cell.borrow_mut() = None);
        }
    }

    let _reset = Reset;

    f(&mut MockClock { _private: () })
}

/// Returns the current monotonic time.
pub fn now() -> Instant {
    CLOCK
        .with(|cell| cell.borrow().as_ref().map(|frozen| frozen.instant))
        .unwrap_or_else(Instant::now)
}

/// Returns the current wall-clock time.
pub fn system_now() -> SystemTime {
    CLOCK
        .with(|cell| cell.borrow().as_ref().map(|frozen| frozen.system))
        .unwrap_or_else(SystemTime::now)
}
