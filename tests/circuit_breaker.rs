use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use sqlbreaker::{
    clock, AdaptiveBreaker, Breaker, CircuitBreaker, Config, Error, NoopBreaker, Proba, Promise,
    Registry, RollingWindow, ServiceUnavailable, NOOP_BREAKER_NAME,
};

const BUCKETS: usize = 10;
const INTERVAL: Duration = Duration::from_millis(10);

/// Healthy traffic never trips the breaker.
#[test]
fn healthy_window_admits() {
    init_tracing();
    clock::freeze(|_| {
        let breaker = new_adaptive_breaker(1);
        mark_success(&breaker, 80);
        assert_eq!(Ok(()), breaker.accept());

        mark_success(&breaker, 120);
        assert_eq!(Ok(()), breaker.accept());
        assert_eq!((200, 200), breaker.history());
    })
}

/// A failure burst makes the breaker reject most calls.
#[test]
fn failure_burst_rejects() {
    init_tracing();
    clock::freeze(|time| {
        let breaker = new_adaptive_breaker(2);
        mark_success(&breaker, 10);
        assert_eq!(Ok(()), breaker.accept());

        mark_failed(&breaker, 100_000);
        time.advance(INTERVAL + Duration::from_millis(1));
        verify(|| breaker.accept() == Err(ServiceUnavailable));
    })
}

/// Below the request threshold any failure rate is tolerated.
#[test]
fn cold_window_admits_regardless_of_failures() {
    clock::freeze(|_| {
        for n in [1, 10, 50, 99] {
            let breaker = new_adaptive_breaker(n);
            for _ in 0..n {
                breaker.mark_failure();
            }
            for _ in 0..100 {
                assert_eq!(Ok(()), breaker.accept());
            }
        }
    })
}

/// `total < k * accepts` keeps the breaker closed at any volume.
#[test]
fn tolerated_failure_rate_admits() {
    clock::freeze(|_| {
        let mut rng = XorShiftRng::seed_from_u64(99);
        for _ in 0..20 {
            let breaker = new_adaptive_breaker(rng.gen());
            let size: u64 = rng.gen_range(0..10_000);
            let accepts = size + 1;
            for _ in 0..accepts {
                breaker.mark_success();
            }
            // Up to four failures per success are still within k = 5.
            for _ in 0..rng.gen_range(0..=3 * accepts) {
                breaker.mark_failure();
            }
            for _ in 0..100 {
                assert_eq!(Ok(()), breaker.accept());
            }
        }
    })
}

/// The empirical rejection rate converges to `(total - k * accepts) / (total + 1)`.
#[test]
fn rejection_rate_converges_to_drop_ratio() {
    clock::freeze(|_| {
        for &(accepts, failures) in &[(0u64, 200u64), (50, 450), (100, 2_900), (300, 2_000)] {
            let breaker = new_adaptive_breaker(accepts + failures);
            for _ in 0..accepts {
                breaker.mark_success();
            }
            for _ in 0..failures {
                breaker.mark_failure();
            }

            let total = (accepts + failures) as f64;
            let expected = ((total - 5.0 * accepts as f64) / (total + 1.0)).max(0.0);

            let trials = 20_000;
            let rejected = (0..trials).filter(|_| breaker.accept().is_err()).count();
            let rate = rejected as f64 / trials as f64;
            assert!(
                (rate - expected).abs() < 0.02,
                "accepts={} failures={} rate={} expected={}",
                accepts,
                failures,
                rate,
                expected
            );
        }
    })
}

/// Once the failure burst leaves the window, sustained success closes the breaker again.
#[test]
fn recovers_after_burst_leaves_window() {
    clock::freeze(|time| {
        let breaker = new_adaptive_breaker(3);
        mark_failed(&breaker, 10_000);
        time.advance(INTERVAL * 2);
        verify(|| breaker.allow().is_err());

        // Half of the window later the burst is still visible.
        time.advance(INTERVAL * 5);
        verify(|| breaker.accept().is_err());

        time.advance(INTERVAL * 5);
        assert_eq!((0, 0), breaker.history());
        mark_success(&breaker, 10_000);
        verify(|| breaker.accept().is_ok());
        assert_eq!(0.0, breaker.drop_ratio());
    })
}

/// Concurrent callers share one breaker without losing or double counting outcomes.
#[test]
fn concurrent_outcomes_are_counted_once() {
    init_tracing();
    let breaker = Config::new()
        .name("shared")
        .bucket_duration(Duration::from_secs(60))
        .build();
    let threads = 8;
    let calls = 500;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let breaker = breaker.clone();
            thread::spawn(move || {
                for i in 0..calls {
                    let promise = breaker.allow().expect("healthy breaker admits");
                    if (t + i) % 2 == 0 {
                        promise.accept();
                    } else {
                        promise.reject("deadlock detected");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = (threads * calls) as u64;
    assert_eq!((total / 2, total), breaker.history());
    assert_eq!(5, breaker.recent_errors().lines().count());
}

/// Concurrent callers observe rejections once the dependency fails.
#[test]
fn concurrent_callers_fail_fast() {
    let breaker = Config::new()
        .name("failing")
        .bucket_duration(Duration::from_secs(60))
        .seed(11)
        .build();
    let reached = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let breaker = breaker.clone();
            let reached = reached.clone();
            let rejected = rejected.clone();
            thread::spawn(move || {
                for _ in 0..5_000 {
                    let result = breaker.call(|| {
                        reached.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>("connection refused")
                    });
                    if let Err(Error::Rejected) = result {
                        rejected.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let reached = reached.load(Ordering::SeqCst);
    assert_eq!(20_000, reached + rejected.load(Ordering::SeqCst));
    assert!(reached < 2_000, "reached {}", reached);
    assert_eq!((0, reached as u64), breaker.history());
}

#[test]
fn facade_error_log_is_most_recent_first() {
    let breaker = Config::new().history_capacity(3).build();
    for reason in ["first", "second", "third", "fourth"] {
        breaker.allow().unwrap().reject(reason);
    }
    breaker.allow().unwrap().accept();

    let log = breaker.recent_errors();
    let reasons: Vec<_> = log
        .lines()
        .map(|line| line.split_once(' ').unwrap().1)
        .collect();
    assert_eq!(vec!["fourth", "third", "second"], reasons);
}

#[test]
fn noop_breaker_has_fixed_identity() {
    let breaker = NoopBreaker;
    assert_eq!(NOOP_BREAKER_NAME, breaker.name());
    assert_ne!(NOOP_BREAKER_NAME, CircuitBreaker::default().name());

    for _ in 0..1_000 {
        breaker.allow().unwrap().reject("ignored");
    }
    breaker.allow().unwrap().accept();
}

#[test]
fn registry_hands_out_shared_breakers() {
    let registry = Registry::new(Config::new().bucket_duration(Duration::from_secs(60)));
    registry.get_or_create("users").allow().unwrap().accept();
    registry.get_or_create("users").allow().unwrap().reject("timeout");

    let users = registry.get("users").unwrap();
    assert_eq!((1, 2), users.history());
    assert!(users.recent_errors().ends_with("timeout"));
    assert!(registry.get("orders").is_none());
}

fn new_adaptive_breaker(seed: u64) -> AdaptiveBreaker<XorShiftRng> {
    let window = RollingWindow::new(BUCKETS, INTERVAL);
    let proba = Proba::with_rng(XorShiftRng::seed_from_u64(seed));
    AdaptiveBreaker::with_proba(window, 5.0, 100, proba)
}

fn mark_success(breaker: &AdaptiveBreaker<XorShiftRng>, count: usize) {
    for _ in 0..count {
        match breaker.allow() {
            Ok(promise) => promise.accept(),
            Err(_) => break,
        }
    }
}

fn mark_failed(breaker: &AdaptiveBreaker<XorShiftRng>, count: usize) {
    for _ in 0..count {
        if let Ok(promise) = breaker.allow() {
            promise.reject();
        }
    }
}

fn verify<F>(mut f: F)
where
    F: FnMut() -> bool,
{
    let count = (0..100).filter(|_| f()).count();
    assert!(count >= 80, "should be at least 80, actual {}", count);
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
