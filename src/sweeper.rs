//! Periodic reclamation of idle counters.

use std::{
    sync::{
        Arc, Weak,
        mpsc::{self, RecvTimeoutError},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::Mutex;

use crate::{Clock, EntityStore, RetentionMs, SweepIntervalMs};

struct SweeperHandle {
    stop_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

/// Background thread that drops counters idle for longer than a retention window.
///
/// Each tick calls [`EntityStore::evict_idle_counters`]; account and number
/// records are never removed. A counter recreated after eviction starts with
/// an empty window, which is what an idle counter would have held anyway.
///
/// The loop ticks once immediately on start and then every `interval`. It
/// only holds a weak reference to the store and exits on its own if the
/// store is dropped.
pub struct ReclamationSweeper {
    store: Weak<EntityStore>,
    clock: Arc<dyn Clock>,
    handle: Mutex<Option<SweeperHandle>>,
}

impl ReclamationSweeper {
    /// Create a stopped sweeper for `store`.
    pub fn new(store: &Arc<EntityStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::downgrade(store),
            clock,
            handle: Mutex::new(None),
        }
    }

    /// Whether the background thread is running.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }

    /// Start the loop. No-op if it is already running.
    ///
    /// Both timings are validated newtypes, so the loop always sleeps at least
    /// a millisecond between ticks.
    pub fn start(&self, retention: RetentionMs, interval: SweepIntervalMs) {
        let retention = Duration::from_millis(*retention);
        let interval = Duration::from_millis(*interval);

        let mut handle = self.handle.lock();

        if let Some(running) = handle.as_ref()
            && !running.join.is_finished()
        {
            tracing::debug!("sweeper.start ignored, already running");
            return;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let store = self.store.clone();
        let clock = self.clock.clone();

        let join = thread::spawn(move || {
            loop {
                let Some(store) = store.upgrade() else {
                    break;
                };

                let report = store.evict_idle_counters(clock.now(), retention);
                drop(store);

                if report.total() > 0 {
                    tracing::info!(
                        number_counters = report.number_counters_evicted,
                        account_counters = report.account_counters_evicted,
                        "sweeper.evicted idle counters"
                    );
                }

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            tracing::debug!("sweeper.stopped");
        });

        tracing::debug!(
            retention_ms = retention.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "sweeper.started"
        );

        *handle = Some(SweeperHandle { stop_tx, join });
    } // end method start

    /// Stop the loop and wait for the thread to exit. Idempotent.
    pub fn stop(&self) {
        let Some(running) = self.handle.lock().take() else {
            return;
        };

        let _ = running.stop_tx.send(());

        if running.join.join().is_err() {
            tracing::error!("sweeper.stop, background thread panicked");
        }
    } // end method stop
}

impl Drop for ReclamationSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
