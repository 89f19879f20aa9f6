//! The admission decision core.
//!
//! [`AdmissionEngine`] composes the inactive, cooldown, per-number and
//! per-account checks against an [`EntityStore`](crate::EntityStore) and
//! only mutates state on a grant.
//!
//! # Examples
//!
//! ```no_run
//! use sms_guard::{AccountId, AdmissionDecision, SmsGuard, SmsGuardOptions};
//!
//! let guard = SmsGuard::new(SmsGuardOptions::default());
//! let account_id = AccountId::new_v4();
//! let phone = "+15551234567".parse().unwrap();
//!
//! match guard.check_admission(account_id, &phone, 5) {
//!     AdmissionDecision::Granted => println!("send it"),
//!     AdmissionDecision::Denied(reason) => println!("429: {reason}"),
//! }
//! ```

mod admission_engine;
pub use admission_engine::*;

mod decision;
pub use decision::*;
