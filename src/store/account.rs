use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};

use crate::{AccountId, AccountSnapshot, Number, PhoneNumber, Timestamp};

/// Live state of one account and the numbers it owns.
///
/// Numbers are held inside the account, so a [`Number`] is never reachable
/// once its account has been dropped from the store.
#[derive(Debug)]
pub struct Account {
    account_id: AccountId,
    account_limit: AtomicU64,
    numbers: DashMap<PhoneNumber, Arc<Number>>,
    admission: Mutex<()>,
    pub(crate) seq: u64,
}

impl Account {
    pub(crate) fn new(account_id: AccountId, account_limit: u64, seq: u64) -> Self {
        Self {
            account_id,
            account_limit: AtomicU64::new(account_limit),
            numbers: DashMap::new(),
            admission: Mutex::new(()),
            seq,
        }
    }

    /// Account identifier.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Maximum grants within the rolling window across all numbers of the account.
    pub fn account_limit(&self) -> u64 {
        self.account_limit.load(Ordering::Acquire)
    }

    pub(crate) fn set_account_limit(&self, limit: u64) {
        self.account_limit.store(limit, Ordering::Release);
    }

    /// Look up one of the account's numbers.
    pub fn number(&self, phone_number: &PhoneNumber) -> Option<Arc<Number>> {
        self.numbers.get(phone_number).map(|n| n.clone())
    }

    /// How many numbers the account currently owns.
    pub fn number_count(&self) -> usize {
        self.numbers.len()
    }

    /// All numbers in creation order.
    pub fn numbers(&self) -> Vec<Arc<Number>> {
        let mut numbers: Vec<_> = self.numbers.iter().map(|n| n.value().clone()).collect();
        numbers.sort_by_key(|n| n.seq);
        numbers
    }

    /// Sum of every number's lifetime granted checks.
    pub fn total_checks_performed(&self) -> u64 {
        self.numbers
            .iter()
            .map(|n| n.checks_performed())
            .fold(0u64, u64::saturating_add)
    }

    /// Most recent granted check across all numbers of the account.
    ///
    /// Numbers added concurrently may or may not be observed.
    pub fn latest_check_time(&self) -> Option<Timestamp> {
        self.numbers
            .iter()
            .filter_map(|n| n.last_check_time())
            .max()
    }

    pub(crate) fn numbers_map(&self) -> &DashMap<PhoneNumber, Arc<Number>> {
        &self.numbers
    }

    pub(crate) fn admission_lock(&self) -> MutexGuard<'_, ()> {
        self.admission.lock()
    }

    /// Point-in-time copy, numbers in creation order.
    pub fn snapshot(&self) -> AccountSnapshot {
        let numbers: Vec<_> = self.numbers().iter().map(|n| n.snapshot()).collect();
        let total_checks_performed = numbers
            .iter()
            .map(|n| n.checks_performed)
            .fold(0u64, u64::saturating_add);

        AccountSnapshot {
            account_id: self.account_id,
            account_limit: self.account_limit(),
            numbers,
            total_checks_performed,
        }
    }
}
