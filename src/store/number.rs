use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::{AccountId, NumberSnapshot, PhoneNumber, Timestamp};

/// Live state of one phone number inside an [`Account`](crate::Account).
///
/// The identity fields and the personal limit are fixed at creation. The
/// usage fields only change on a granted admission.
#[derive(Debug)]
pub struct Number {
    account_id: AccountId,
    phone_number: PhoneNumber,
    personal_limit: u64,
    active: AtomicBool,
    usage: Mutex<NumberUsage>,
    pub(crate) seq: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NumberUsage {
    pub last_check_time: Option<Timestamp>,
    pub checks_performed: u64,
}

impl Number {
    pub(crate) fn new(
        account_id: AccountId,
        phone_number: PhoneNumber,
        personal_limit: u64,
        seq: u64,
    ) -> Self {
        Self {
            account_id,
            phone_number,
            personal_limit,
            active: AtomicBool::new(true),
            usage: Mutex::new(NumberUsage::default()),
            seq,
        }
    }

    pub(crate) fn seeded(
        account_id: AccountId,
        phone_number: PhoneNumber,
        personal_limit: u64,
        usage: NumberUsage,
        active: bool,
        seq: u64,
    ) -> Self {
        Self {
            account_id,
            phone_number,
            personal_limit,
            active: AtomicBool::new(active),
            usage: Mutex::new(usage),
            seq,
        }
    }

    /// Owning account.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// The phone number this record tracks.
    pub fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    /// Lifetime quota of granted checks.
    pub fn personal_limit(&self) -> u64 {
        self.personal_limit
    }

    /// Time of the most recent granted check, `None` if never granted.
    pub fn last_check_time(&self) -> Option<Timestamp> {
        self.usage.lock().last_check_time
    }

    /// Number of granted checks so far.
    pub fn checks_performed(&self) -> u64 {
        self.usage.lock().checks_performed
    }

    /// Whether the number may still send.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub(crate) fn usage(&self) -> MutexGuard<'_, NumberUsage> {
        self.usage.lock()
    }

    /// Point-in-time copy.
    pub fn snapshot(&self) -> NumberSnapshot {
        let usage = *self.usage.lock();

        NumberSnapshot {
            account_id: self.account_id,
            phone_number: self.phone_number.clone(),
            personal_limit: self.personal_limit,
            last_check_time: usage.last_check_time,
            checks_performed: usage.checks_performed,
            active: self.is_active(),
        }
    }
}
