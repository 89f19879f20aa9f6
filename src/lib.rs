#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod sms_guard;
pub use sms_guard::*;

mod clock;
pub use clock::*;

mod counter;
pub use counter::*;

mod store;
pub use store::*;

mod engine;
pub use engine::*;

mod sweeper;
pub use sweeper::*;

mod error;
pub use error::*;

mod common;
pub use common::{
    AccountId, CooldownMs, PhoneNumber, RetentionMs, SweepIntervalMs, Timestamp, WindowSizeMs,
};

#[cfg(test)]
mod tests;
