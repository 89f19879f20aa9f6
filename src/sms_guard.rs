//! Top-level entrypoint that wires the store, the engine and the sweeper.

use std::{sync::Arc, time::Duration};

use crate::{
    AccountId, AccountSeed, AccountSnapshot, AdmissionDecision, AdmissionEngine, Clock,
    CooldownMs, EntityStore, PhoneNumber, ReclamationSweeper, RetentionMs, SmsGuardError,
    SweepIntervalMs, SystemClock, WindowSizeMs,
};

/// Top-level configuration for [`SmsGuard`].
///
/// The defaults match the production policy: a 1 s rolling window, a 1 s
/// cooldown, and hourly reclamation of counters idle for an hour.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmsGuardOptions {
    /// Trailing window of the per-number and per-account counters.
    pub window_size_ms: WindowSizeMs,
    /// Minimum spacing between grants of a number or of an account.
    pub cooldown_ms: CooldownMs,
    /// Period of the reclamation loop started by [`SmsGuard::run_cleanup_loop`].
    pub sweep_interval_ms: SweepIntervalMs,
    /// Idle time after which a counter is reclaimed.
    pub retention_ms: RetentionMs,
}

/// Admission control entrypoint.
///
/// Owns one [`EntityStore`] and exposes the operations a request handler and
/// a bootstrap routine need. Instances are fully independent of each other.
pub struct SmsGuard {
    options: SmsGuardOptions,
    store: Arc<EntityStore>,
    engine: AdmissionEngine,
    sweeper: ReclamationSweeper,
}

impl SmsGuard {
    /// Create a new [`SmsGuard`] on the system clock.
    pub fn new(options: SmsGuardOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Create a new [`SmsGuard`] reading time from `clock`.
    pub fn with_clock(options: SmsGuardOptions, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(EntityStore::new(Duration::from_millis(
            *options.window_size_ms,
        )));

        Self {
            engine: AdmissionEngine::new(store.clone(), clock.clone(), options.cooldown_ms),
            sweeper: ReclamationSweeper::new(&store, clock),
            store,
            options,
        }
    }

    /// Options this instance was built with.
    pub fn options(&self) -> &SmsGuardOptions {
        &self.options
    }

    /// Access the admission engine.
    pub fn engine(&self) -> &AdmissionEngine {
        &self.engine
    }

    /// Access the entity store.
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// See [`AdmissionEngine::check_admission`].
    pub fn check_admission(
        &self,
        account_id: AccountId,
        phone_number: &PhoneNumber,
        personal_limit: u64,
    ) -> AdmissionDecision {
        self.engine
            .check_admission(account_id, phone_number, personal_limit)
    }

    /// See [`EntityStore::list_accounts`].
    pub fn list_accounts(&self) -> Vec<AccountSnapshot> {
        self.store.list_accounts()
    }

    /// See [`EntityStore::replace_all`].
    pub fn replace_all(&self, seeds: Vec<AccountSeed>) -> Result<(), SmsGuardError> {
        self.store.replace_all(seeds)
    }

    /// Start the reclamation loop with the configured retention and interval.
    pub fn run_cleanup_loop(&self) {
        self.run_cleanup_loop_with_config(
            self.options.retention_ms,
            self.options.sweep_interval_ms,
        );
    }

    /// Start the reclamation loop with explicit timings.
    ///
    /// Idempotent: while a loop is running further calls are ignored, including
    /// their configuration.
    pub fn run_cleanup_loop_with_config(
        &self,
        retention_ms: RetentionMs,
        interval_ms: SweepIntervalMs,
    ) {
        self.sweeper.start(retention_ms, interval_ms);
    }

    /// Stop the reclamation loop. Idempotent; the loop can be started again.
    pub fn stop_cleanup_loop(&self) {
        self.sweeper.stop();
    }
}
