use std::{collections::VecDeque, time::Duration};

use parking_lot::Mutex;

use crate::Timestamp;

/// Exact sliding-window log of event timestamps.
///
/// # Algorithm
///
/// 1. **Record:** append `now` to the tail and mark the counter as used
/// 2. **Prune:** pop from the head while `now - head > window`
/// 3. **Count:** prune, then return the number of remaining events
///
/// Events are appended in call order, so the log is sorted oldest-first and
/// pruning stops at the first event still inside the window.
///
/// # Thread Safety
///
/// The log sits behind a [`parking_lot::Mutex`]; concurrent `record` and
/// `count` calls on the same counter never lose or corrupt entries.
#[derive(Debug)]
pub struct SlidingWindowCounter {
    window: Duration,
    state: Mutex<CounterState>,
}

#[derive(Debug)]
struct CounterState {
    events: VecDeque<Timestamp>,
    last_used: Timestamp,
}

impl SlidingWindowCounter {
    /// Create an empty counter. `created_at` seeds the idle clock used by reclamation.
    pub fn new(window: Duration, created_at: Timestamp) -> Self {
        Self {
            window,
            state: Mutex::new(CounterState {
                events: VecDeque::new(),
                last_used: created_at,
            }),
        }
    }

    /// Trailing window size.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of events within the window ending at `now`.
    ///
    /// Prunes expired events as a side effect.
    pub fn count(&self, now: Timestamp) -> u64 {
        let mut state = self.state.lock();
        Self::prune(&mut state.events, self.window, now);
        state.events.len() as u64
    }

    /// Record one event at `now`.
    pub fn record(&self, now: Timestamp) {
        let mut state = self.state.lock();
        state.events.push_back(now);
        state.last_used = now;
        Self::prune(&mut state.events, self.window, now);
    }

    /// Time of the most recent `record` (or of creation if never recorded).
    pub fn last_used(&self) -> Timestamp {
        self.state.lock().last_used
    }

    /// `true` when nothing was recorded for longer than `retention`.
    pub fn is_idle(&self, now: Timestamp, retention: Duration) -> bool {
        now.saturating_duration_since(self.last_used()) > retention
    }

    fn prune(events: &mut VecDeque<Timestamp>, window: Duration, now: Timestamp) {
        while let Some(oldest) = events.front()
            && now.saturating_duration_since(*oldest) > window
        {
            events.pop_front();
        }
    } // end method prune
}
