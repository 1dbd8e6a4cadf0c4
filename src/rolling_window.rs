use std::time::{Duration, Instant};

use super::clock;

/// Outcomes recorded during one bucket duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    /// Number of successful requests.
    pub success: u64,
    /// Number of requests.
    pub total: u64,
}

impl Bucket {
    fn add(&mut self, success: bool) {
        if success {
            self.success += 1;
        }
        self.total += 1;
    }

    fn reset(&mut self) {
        *self = Bucket::default();
    }
}

/// Time windowed outcome counter.
///
/// Keeps a ring of `size` buckets, each covering `interval` of time, so the window spans
/// the trailing `size * interval`. Buckets are rotated lazily on access: nothing runs in
/// the background and a stale bucket is zeroed before it is reused or read.
#[derive(Debug)]
pub struct RollingWindow {
    interval: Duration,
    buckets: Vec<Bucket>,
    index: usize,
    last: Instant,
}

impl RollingWindow {
    /// Creates a new window.
    ///
    /// * `size` - The number of buckets.
    /// * `interval` - The time covered by a single bucket.
    ///
    /// # Panics
    ///
    /// * When `size` is zero.
    /// * When `interval` is zero.
    pub fn new(size: usize, interval: Duration) -> Self {
        assert!(size > 0, "rolling window needs at least one bucket");
        assert!(!interval.is_zero(), "bucket interval must be positive");

        Self {
            interval,
            buckets: vec![Bucket::default(); size],
            index: 0,
            last: clock::now(),
        }
    }

    /// Returns the number of buckets.
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the time covered by a single bucket.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Records one outcome into the current bucket.
    pub fn add(&mut self, success: bool) {
        self.expire();
        self.buckets[self.index].add(success);
    }

    /// Returns `(successes, total)` over all live buckets.
    pub fn aggregate(&mut self) -> (u64, u64) {
        self.expire();
        self.buckets.iter().fold((0, 0), |(success, total), bucket| {
            (success + bucket.success, total + bucket.total)
        })
    }

    /// Drops all recorded history.
    pub fn reset(&mut self) {
        self.buckets.iter_mut().for_each(Bucket::reset);
        self.last = clock::now();
    }

    /// Rotates past every bucket whose time slot has fully elapsed.
    fn expire(&mut self) {
        let now = clock::now();
        let elapsed = now.saturating_duration_since(self.last);
        let interval = self.interval.as_nanos();
        let span = elapsed.as_nanos() / interval;

        if span == 0 {
            return;
        }

        let len = self.buckets.len();
        if span >= len as u128 {
            self.buckets.iter_mut().for_each(Bucket::reset);
            self.index = (self.index + (span % len as u128) as usize) % len;
        } else {
            for _ in 0..span {
                self.index = (self.index + 1) % len;
                self.buckets[self.index].reset();
            }
        }

        // Keep `last` aligned to the start of the current bucket.
        let offset = (elapsed.as_nanos() % interval) as u64;
        self.last = now - Duration::from_nanos(offset);
    }
}
