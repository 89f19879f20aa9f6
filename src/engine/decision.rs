use crate::{AccountId, PhoneNumber, SmsGuardError};

/// Why a send was refused.
///
/// Every variant is an expected outcome of rate limiting, not a fault. The
/// `Display` text is suitable for returning to an API caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DenialReason {
    /// The number has used up its personal quota.
    #[error("The rate limit exceeded for this phone number.")]
    PersonalLimitExceeded,
    /// The account has used up its rolling-window quota.
    #[error("The rate limit exceeded for the account.")]
    AccountLimitExceeded,
    /// The number, or another number of the same account, was granted too recently.
    #[error("Too soon since the last send for this number or its account.")]
    CooldownNotElapsed,
    /// The number has been deactivated and was removed from its account.
    #[error("The phone number is inactive.")]
    NumberInactive,
}

/// Outcome of an admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The send may proceed; all counters have been updated.
    Granted,
    /// The send was refused; no usage was recorded.
    Denied(DenialReason),
}

impl AdmissionDecision {
    /// `true` for [`AdmissionDecision::Granted`].
    pub fn is_granted(&self) -> bool {
        matches!(self, AdmissionDecision::Granted)
    }

    /// The denial reason, if any.
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            AdmissionDecision::Granted => None,
            AdmissionDecision::Denied(reason) => Some(*reason),
        }
    }

    /// Convert into a `Result` so boundary code can use `?`.
    pub fn into_result(self) -> Result<(), DenialReason> {
        match self {
            AdmissionDecision::Granted => Ok(()),
            AdmissionDecision::Denied(reason) => Err(reason),
        }
    }
}

/// A validated admission request.
///
/// Built from the raw strings a request handler receives; malformed
/// identifiers are rejected here, before the engine sees them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Account the number belongs to.
    pub account_id: AccountId,
    /// Number asking to send.
    pub phone_number: PhoneNumber,
    /// Personal limit declared by the caller. Used when the number (and
    /// possibly the account) is created by this request.
    pub personal_limit: u64,
}

impl AdmissionRequest {
    /// Parse and validate a request.
    pub fn new(
        account_id: &str,
        phone_number: &str,
        personal_limit: u64,
    ) -> Result<Self, SmsGuardError> {
        Ok(Self {
            account_id: account_id.parse()?,
            phone_number: phone_number.parse()?,
            personal_limit,
        })
    }
}
