use crate::{AccountId, PhoneNumber, Timestamp};

/// Read-only copy of an account taken by [`EntityStore::list_accounts`](crate::EntityStore::list_accounts).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountSnapshot {
    /// Account identifier.
    pub account_id: AccountId,
    /// Rolling-window quota for the whole account.
    pub account_limit: u64,
    /// Numbers in creation order.
    pub numbers: Vec<NumberSnapshot>,
    /// Sum of `checks_performed` over `numbers`.
    pub total_checks_performed: u64,
}

/// Read-only copy of a number.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumberSnapshot {
    /// Owning account.
    pub account_id: AccountId,
    /// The phone number.
    pub phone_number: PhoneNumber,
    /// Lifetime quota of granted checks.
    pub personal_limit: u64,
    /// Most recent granted check, `None` if never granted.
    pub last_check_time: Option<Timestamp>,
    /// Granted checks so far.
    pub checks_performed: u64,
    /// Whether the number may still send.
    pub active: bool,
}

/// One account of a bulk load, see [`EntityStore::replace_all`](crate::EntityStore::replace_all).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountSeed {
    /// Account identifier.
    pub account_id: AccountId,
    /// Rolling-window quota for the whole account.
    pub account_limit: u64,
    /// Numbers to install under the account.
    #[cfg_attr(feature = "serde", serde(default))]
    pub numbers: Vec<NumberSeed>,
}

impl AccountSeed {
    /// Seed with no numbers.
    pub fn new(account_id: AccountId, account_limit: u64) -> Self {
        Self {
            account_id,
            account_limit,
            numbers: Vec::new(),
        }
    }

    /// Add a number to the seed.
    pub fn with_number(mut self, number: NumberSeed) -> Self {
        self.numbers.push(number);
        self
    }
}

/// One number of a bulk load.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumberSeed {
    /// The phone number.
    pub phone_number: PhoneNumber,
    /// Lifetime quota of granted checks.
    pub personal_limit: u64,
    /// Most recent granted check, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub last_check_time: Option<Timestamp>,
    /// Granted checks already consumed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub checks_performed: u64,
    /// Whether the number may send.
    #[cfg_attr(feature = "serde", serde(default = "default_active"))]
    pub active: bool,
}

#[cfg(feature = "serde")]
fn default_active() -> bool {
    true
}

impl NumberSeed {
    /// Active, never-checked number.
    pub fn new(phone_number: PhoneNumber, personal_limit: u64) -> Self {
        Self {
            phone_number,
            personal_limit,
            last_check_time: None,
            checks_performed: 0,
            active: true,
        }
    }
}
