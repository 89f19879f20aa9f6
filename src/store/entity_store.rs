use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::{
    Account, AccountId, AccountSeed, AccountSnapshot, Number, PhoneNumber, SlidingWindowCounter,
    SmsGuardError, Timestamp, store::number::NumberUsage,
};

pub(crate) type NumberKey = (AccountId, PhoneNumber);

/// Counts of counters removed by one [`EntityStore::evict_idle_counters`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Per-number counters removed.
    pub number_counters_evicted: usize,
    /// Per-account counters removed.
    pub account_counters_evicted: usize,
}

impl SweepReport {
    /// Total counters removed.
    pub fn total(&self) -> usize {
        self.number_counters_evicted + self.account_counters_evicted
    }
}

/// Canonical in-memory state for every known account and number, plus the
/// sliding-window counters attached to them.
///
/// # Thread Safety
///
/// - Accounts, numbers and counters live in [`DashMap`]s; get-or-create goes
///   through `entry()`, so racing creators all observe the same instance
/// - [`replace_all`](Self::replace_all) takes the write side of a generation
///   lock, every other operation the read side, so a bulk load is never
///   observed half-applied
///
/// # Counters
///
/// Counters are side-tables keyed by `(account, phone number)` and by account.
/// They are created lazily on the first granted send and are the only thing
/// [`evict_idle_counters`](Self::evict_idle_counters) ever removes. Account and
/// number records are not touched by reclamation.
#[derive(Debug)]
pub struct EntityStore {
    window: Duration,
    generation: RwLock<()>,
    accounts: DashMap<AccountId, Arc<Account>>,
    number_counters: DashMap<NumberKey, Arc<SlidingWindowCounter>>,
    account_counters: DashMap<AccountId, Arc<SlidingWindowCounter>>,
    next_seq: AtomicU64,
}

impl EntityStore {
    /// Create an empty store whose counters use `window` as their trailing window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: RwLock::new(()),
            accounts: DashMap::new(),
            number_counters: DashMap::new(),
            account_counters: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    } // end method new

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Trailing window of every counter in the store.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Return the account for `account_id`, creating it with `default_limit` if unseen.
    pub fn get_or_create_account(&self, account_id: AccountId, default_limit: u64) -> Arc<Account> {
        let _generation = self.generation.read();

        if let Some(account) = self.accounts.get(&account_id) {
            return account.clone();
        }

        self.accounts
            .entry(account_id)
            .or_insert_with(|| {
                tracing::debug!(%account_id, account_limit = default_limit, "account.created");
                Arc::new(Account::new(account_id, default_limit, self.next_seq()))
            })
            .clone()
    } // end method get_or_create_account

    /// Return the number `phone_number` of `account`, creating it with
    /// `default_personal_limit` if unseen.
    pub fn get_or_create_number(
        &self,
        account: &Account,
        phone_number: &PhoneNumber,
        default_personal_limit: u64,
    ) -> Arc<Number> {
        let _generation = self.generation.read();

        if let Some(number) = account.number(phone_number) {
            return number;
        }

        account
            .numbers_map()
            .entry(phone_number.clone())
            .or_insert_with(|| {
                tracing::debug!(
                    account_id = %account.account_id(),
                    %phone_number,
                    personal_limit = default_personal_limit,
                    "number.created"
                );
                Arc::new(Number::new(
                    account.account_id(),
                    phone_number.clone(),
                    default_personal_limit,
                    self.next_seq(),
                ))
            })
            .clone()
    } // end method get_or_create_number

    /// Remove a number from its account and drop its per-number counter.
    pub fn remove_number(&self, account: &Account, phone_number: &PhoneNumber) -> Option<Arc<Number>> {
        let _generation = self.generation.read();

        self.number_counters
            .remove(&(account.account_id(), phone_number.clone()));

        account
            .numbers_map()
            .remove(phone_number)
            .map(|(_, number)| number)
    }

    /// Look up an account.
    pub fn account(&self, account_id: &AccountId) -> Option<Arc<Account>> {
        let _generation = self.generation.read();
        self.accounts.get(account_id).map(|a| a.clone())
    }

    /// Look up a number.
    pub fn number(&self, account_id: &AccountId, phone_number: &PhoneNumber) -> Option<Arc<Number>> {
        self.account(account_id)?.number(phone_number)
    }

    /// Override an account's limit. Returns `false` if the account is unknown.
    ///
    /// Accounts created by an admission request inherit the personal limit of
    /// the number that created them; use this to set the real account quota.
    pub fn set_account_limit(&self, account_id: &AccountId, limit: u64) -> bool {
        match self.account(account_id) {
            Some(account) => {
                account.set_account_limit(limit);
                true
            }
            None => false,
        }
    }

    /// Mark a number active or inactive. Returns `false` if the number is unknown.
    ///
    /// An inactive number is removed by the next admission request that names it.
    pub fn set_number_active(
        &self,
        account_id: &AccountId,
        phone_number: &PhoneNumber,
        active: bool,
    ) -> bool {
        match self.number(account_id, phone_number) {
            Some(number) => {
                number.set_active(active);
                true
            }
            None => false,
        }
    }

    /// Discard every account, number and counter and install `seeds`.
    ///
    /// The seed set is validated first; on error the store is left untouched.
    pub fn replace_all(&self, seeds: Vec<AccountSeed>) -> Result<(), SmsGuardError> {
        Self::validate_seeds(&seeds)?;

        let _generation = self.generation.write();

        self.accounts.clear();
        self.number_counters.clear();
        self.account_counters.clear();

        let account_count = seeds.len();

        for seed in seeds {
            let account = Account::new(seed.account_id, seed.account_limit, self.next_seq());

            for number in seed.numbers {
                let usage = NumberUsage {
                    last_check_time: number.last_check_time,
                    checks_performed: number.checks_performed,
                };

                account.numbers_map().insert(
                    number.phone_number.clone(),
                    Arc::new(Number::seeded(
                        seed.account_id,
                        number.phone_number,
                        number.personal_limit,
                        usage,
                        number.active,
                        self.next_seq(),
                    )),
                );
            }

            self.accounts.insert(seed.account_id, Arc::new(account));
        }

        tracing::info!(accounts = account_count, "store.replace_all");

        Ok(())
    } // end method replace_all

    fn validate_seeds(seeds: &[AccountSeed]) -> Result<(), SmsGuardError> {
        let mut account_ids = HashSet::with_capacity(seeds.len());

        for seed in seeds {
            if !account_ids.insert(seed.account_id) {
                return Err(SmsGuardError::DuplicateAccount(seed.account_id));
            }

            let mut phone_numbers = HashSet::with_capacity(seed.numbers.len());
            for number in &seed.numbers {
                if !phone_numbers.insert(&number.phone_number) {
                    return Err(SmsGuardError::DuplicateNumber {
                        account_id: seed.account_id,
                        phone_number: number.phone_number.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Point-in-time copies of every account, in creation order.
    pub fn list_accounts(&self) -> Vec<AccountSnapshot> {
        let _generation = self.generation.read();

        let mut accounts: Vec<_> = self.accounts.iter().map(|a| a.value().clone()).collect();
        accounts.sort_by_key(|a| a.seq);
        accounts.iter().map(|a| a.snapshot()).collect()
    }

    /// Number of known accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Per-number counter, created empty if missing.
    pub fn number_counter(
        &self,
        account_id: AccountId,
        phone_number: &PhoneNumber,
        now: Timestamp,
    ) -> Arc<SlidingWindowCounter> {
        let _generation = self.generation.read();
        let key = (account_id, phone_number.clone());

        if let Some(counter) = self.number_counters.get(&key) {
            return counter.clone();
        }

        self.number_counters
            .entry(key)
            .or_insert_with(|| Arc::new(SlidingWindowCounter::new(self.window, now)))
            .clone()
    }

    /// Per-account counter, created empty if missing.
    pub fn account_counter(&self, account_id: AccountId, now: Timestamp) -> Arc<SlidingWindowCounter> {
        let _generation = self.generation.read();

        if let Some(counter) = self.account_counters.get(&account_id) {
            return counter.clone();
        }

        self.account_counters
            .entry(account_id)
            .or_insert_with(|| Arc::new(SlidingWindowCounter::new(self.window, now)))
            .clone()
    }

    /// In-window sends of a number; zero when no counter exists. Never creates a counter.
    pub fn number_window_count(
        &self,
        account_id: AccountId,
        phone_number: &PhoneNumber,
        now: Timestamp,
    ) -> u64 {
        let _generation = self.generation.read();
        let counter = self
            .number_counters
            .get(&(account_id, phone_number.clone()))
            .map(|c| c.clone());

        counter.map_or(0, |c| c.count(now))
    }

    /// In-window sends of an account; zero when no counter exists. Never creates a counter.
    pub fn account_window_count(&self, account_id: AccountId, now: Timestamp) -> u64 {
        let _generation = self.generation.read();
        let counter = self.account_counters.get(&account_id).map(|c| c.clone());

        counter.map_or(0, |c| c.count(now))
    }

    /// Remove every counter unused for longer than `retention`.
    pub fn evict_idle_counters(&self, now: Timestamp, retention: Duration) -> SweepReport {
        let _generation = self.generation.read();

        let numbers_before = self.number_counters.len();
        self.number_counters
            .retain(|_, counter| !counter.is_idle(now, retention));

        let accounts_before = self.account_counters.len();
        self.account_counters
            .retain(|_, counter| !counter.is_idle(now, retention));

        SweepReport {
            number_counters_evicted: numbers_before.saturating_sub(self.number_counters.len()),
            account_counters_evicted: accounts_before.saturating_sub(self.account_counters.len()),
        }
    } // end method evict_idle_counters

    /// Sizes of the (per-number, per-account) counter tables.
    pub fn tracked_counters(&self) -> (usize, usize) {
        (self.number_counters.len(), self.account_counters.len())
    }
}
