use std::{sync::Arc, thread, time::Duration};

use crate::{SlidingWindowCounter, Timestamp};

fn at(ms: u64) -> Timestamp {
    Timestamp::from_millis(ms)
}

fn counter() -> SlidingWindowCounter {
    SlidingWindowCounter::new(Duration::from_millis(1_000), at(0))
}

#[test]
fn empty_counter_counts_zero() {
    assert_eq!(counter().count(at(10_000)), 0);
}

#[test]
fn counts_events_within_window() {
    let c = counter();

    c.record(at(100));
    c.record(at(200));
    c.record(at(300));

    assert_eq!(c.count(at(300)), 3);
    assert_eq!(c.count(at(1_000)), 3);
}

#[test]
fn event_exactly_window_old_is_still_counted() {
    let c = counter();

    c.record(at(100));

    // Pruning removes only entries strictly older than the window.
    assert_eq!(c.count(at(1_100)), 1);
    assert_eq!(c.count(at(1_101)), 0);
}

#[test]
fn prunes_prefix_but_keeps_newer_events() {
    let c = counter();

    c.record(at(0));
    c.record(at(500));
    c.record(at(900));

    assert_eq!(c.count(at(1_200)), 2);
    assert_eq!(c.count(at(1_600)), 1);
    assert_eq!(c.count(at(2_000)), 0);
}

#[test]
fn record_prunes_stale_entries() {
    let c = counter();

    c.record(at(0));
    c.record(at(5_000));

    assert_eq!(c.count(at(5_000)), 1);
}

#[test]
fn last_used_tracks_creation_then_records() {
    let c = SlidingWindowCounter::new(Duration::from_millis(1_000), at(42));
    assert_eq!(c.last_used(), at(42));

    c.record(at(900));
    assert_eq!(c.last_used(), at(900));

    // Counting is not a use.
    let _ = c.count(at(1_500));
    assert_eq!(c.last_used(), at(900));
}

#[test]
fn idle_only_after_retention_is_exceeded() {
    let c = counter();
    c.record(at(1_000));

    let retention = Duration::from_millis(500);
    assert!(!c.is_idle(at(1_400), retention));
    assert!(!c.is_idle(at(1_500), retention));
    assert!(c.is_idle(at(1_501), retention));
}

#[test]
fn concurrent_records_are_not_lost() {
    let c = Arc::new(SlidingWindowCounter::new(Duration::from_secs(60), at(0)));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let c = c.clone();

            thread::spawn(move || {
                for _ in 0..250 {
                    c.record(at(10));
                    let _ = c.count(at(10));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().expect("thread panicked");
    }

    assert_eq!(c.count(at(10)), 2_000);
}
