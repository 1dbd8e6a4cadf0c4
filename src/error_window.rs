use std::fmt::{self, Display};

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use super::clock;

/// A bounded log of the most recent failure reasons.
///
/// Holds at most `capacity` entries, each prefixed with the local time it was recorded
/// (`HH:MM:SS`). Once full, the oldest entry is overwritten. The log is only meant for
/// diagnostics and has no effect on admission.
#[derive(Debug)]
pub struct ErrorWindow {
    inner: Mutex<Reasons>,
}

#[derive(Debug)]
struct Reasons {
    reasons: Vec<String>,
    index: usize,
    count: usize,
}

impl ErrorWindow {
    /// Creates a new log holding up to `capacity` reasons.
    ///
    /// # Panics
    ///
    /// When `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "error window capacity must be positive");

        Self {
            inner: Mutex::new(Reasons {
                reasons: vec![String::new(); capacity],
                index: 0,
                count: 0,
            }),
        }
    }

    /// Records a reason, evicting the oldest one when full.
    pub fn add(&self, reason: &str) {
        let recorded = DateTime::<Local>::from(clock::system_now());
        let entry = format!("{} {}", recorded.format("%H:%M:%S"), reason);

        let mut inner = self.inner.lock();
        let capacity = inner.reasons.len();
        let index = inner.index;
        inner.reasons[index] = entry;
        inner.index = (index + 1) % capacity;
        inner.count = (inner.count + 1).min(capacity);
    }

    /// Returns the held reasons, most recent first.
    pub fn reasons(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let capacity = inner.reasons.len();

        (1..=inner.count)
            .map(|back| inner.reasons[(inner.index + capacity - back) % capacity].clone())
            .collect()
    }

    /// Returns the number of held reasons.
    pub fn len(&self) -> usize {
        self.inner.lock().count
    }

    /// Returns `true` if nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for ErrorWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.reasons().join("\n"))
    }
}
