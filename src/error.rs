use crate::{AccountId, PhoneNumber};

/// Error type for this crate.
///
/// Admission denials are not errors; see [`DenialReason`](crate::DenialReason).
/// These variants cover malformed input handed to the engine or the store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SmsGuardError {
    /// The account id is not a valid UUID.
    #[error("invalid account id: {0:?}")]
    InvalidAccountId(String),
    /// The phone number is not an optional `+` followed by 1 to 15 digits.
    #[error("invalid phone number: {0:?}")]
    InvalidPhoneNumber(String),
    /// A bulk load named the same account twice.
    #[error("duplicate account in seed set: {0}")]
    DuplicateAccount(AccountId),
    /// A bulk load named the same phone number twice within one account.
    #[error("duplicate number {phone_number} in seed for account {account_id}")]
    DuplicateNumber {
        /// Account that carries the duplicate.
        account_id: AccountId,
        /// The repeated phone number.
        phone_number: PhoneNumber,
    },
}
