//! Sliding-window event counters.
//!
//! One counter exists per phone number and one per account. Each records the
//! timestamps of granted sends and reports how many fall inside the trailing
//! window.

mod sliding_window_counter;
pub use sliding_window_counter::*;
