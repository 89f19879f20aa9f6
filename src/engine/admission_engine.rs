use std::{sync::Arc, time::Duration};

use crate::{
    AccountId, AdmissionDecision, AdmissionRequest, Clock, CooldownMs, DenialReason, EntityStore,
    PhoneNumber, Timestamp,
};

/// Decides whether a number may send an SMS right now.
///
/// # Algorithm
///
/// Checks run in a fixed priority order; the first failing check decides:
///
/// 1. **Inactive:** the number is removed from its account and its counter dropped
/// 2. **Cooldown:** less than `cooldown` since this number's last grant, or
///    since the latest grant of any number in the same account
/// 3. **Personal quota:** `checks_performed >= personal_limit`
/// 4. **Account quota:** sends in the account's trailing window `>= account_limit`
///
/// If every check passes the number's `last_check_time` and `checks_performed`
/// are updated and both the number and account counters record the send.
///
/// # Semantics
///
/// **Sticky limits:**
/// - The first request for a number stores its personal limit
/// - The first request for an account stores that same value as the account limit
/// - Later requests do not update either; use
///   [`EntityStore::set_account_limit`] to change the account quota
///
/// **No mutation on denial:**
/// - Cooldown and quota denials leave every number field untouched and create
///   no counters
///
/// **Per-account serialization:**
/// - Steps 2 to 4 and the update run under the account's admission lock, so two
///   requests of the same account cannot both pass the cooldown
/// - Requests of different accounts never contend
pub struct AdmissionEngine {
    store: Arc<EntityStore>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
}

impl AdmissionEngine {
    /// Create an engine over `store`, reading time from `clock`.
    pub fn new(store: Arc<EntityStore>, clock: Arc<dyn Clock>, cooldown: CooldownMs) -> Self {
        Self {
            store,
            clock,
            cooldown: Duration::from_millis(*cooldown),
        }
    } // end method new

    /// The store this engine reads and mutates.
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Minimum spacing between grants.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Check a validated [`AdmissionRequest`].
    pub fn check(&self, request: &AdmissionRequest) -> AdmissionDecision {
        self.check_admission(
            request.account_id,
            &request.phone_number,
            request.personal_limit,
        )
    }

    /// Decide whether `phone_number` of `account_id` may send now.
    ///
    /// # Arguments
    ///
    /// - `account_id`: owning account; created with `personal_limit` as its
    ///   account limit if unseen
    /// - `phone_number`: number asking to send; created with `personal_limit` if unseen
    /// - `personal_limit`: declared per-number quota. **Sticky:** ignored once the
    ///   number exists
    ///
    /// # Returns
    ///
    /// - [`AdmissionDecision::Granted`]: usage recorded
    /// - [`AdmissionDecision::Denied`]: nothing recorded, except that an inactive
    ///   number is removed
    pub fn check_admission(
        &self,
        account_id: AccountId,
        phone_number: &PhoneNumber,
        personal_limit: u64,
    ) -> AdmissionDecision {
        let now = self.clock.now();

        let account = self.store.get_or_create_account(account_id, personal_limit);
        let number = self
            .store
            .get_or_create_number(&account, phone_number, personal_limit);

        if !number.is_active() {
            self.store.remove_number(&account, phone_number);
            tracing::warn!(%account_id, %phone_number, "admission.number_inactive, removed from account");
            return AdmissionDecision::Denied(DenialReason::NumberInactive);
        }

        let _admission = account.admission_lock();

        // Read before taking this number's usage lock: the scan locks every
        // number, and store reads must not wait on a bulk load while it is held.
        let account_latest = account.latest_check_time();
        let account_sends = self.store.account_window_count(account_id, now);

        let mut usage = number.usage();

        if self.cooling_down(now, usage.last_check_time) || self.cooling_down(now, account_latest) {
            return self.deny(account_id, phone_number, DenialReason::CooldownNotElapsed);
        }

        if usage.checks_performed >= number.personal_limit() {
            return self.deny(account_id, phone_number, DenialReason::PersonalLimitExceeded);
        }

        if account_sends >= account.account_limit() {
            return self.deny(account_id, phone_number, DenialReason::AccountLimitExceeded);
        }

        usage.last_check_time = Some(now);
        usage.checks_performed = usage.checks_performed.saturating_add(1);
        drop(usage);

        self.store
            .number_counter(account_id, phone_number, now)
            .record(now);
        self.store.account_counter(account_id, now).record(now);

        AdmissionDecision::Granted
    } // end method check_admission

    fn cooling_down(&self, now: Timestamp, last: Option<Timestamp>) -> bool {
        last.is_some_and(|last| now.saturating_duration_since(last) < self.cooldown)
    }

    fn deny(
        &self,
        account_id: AccountId,
        phone_number: &PhoneNumber,
        reason: DenialReason,
    ) -> AdmissionDecision {
        tracing::debug!(%account_id, %phone_number, ?reason, "admission.denied");
        AdmissionDecision::Denied(reason)
    }
}
