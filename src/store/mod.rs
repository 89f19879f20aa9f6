//! Account and number state.
//!
//! [`EntityStore`] is the single owner of every [`Account`], the [`Number`]s
//! inside it, and the sliding-window counters attached to both. It is an
//! explicit object: an engine is handed the store it works on, so several
//! independent stores can live in one process.
//!
//! # Key Characteristics
//!
//! - **Idempotent creation:** one record per account id and per (account, phone number)
//! - **Snapshots for readers:** [`EntityStore::list_accounts`] copies state out
//!   instead of exposing the live maps
//! - **Atomic bulk load:** [`EntityStore::replace_all`] swaps the whole entity set
//! - **Process-scoped:** nothing survives a restart

mod account;
pub use account::*;

mod entity_store;
pub use entity_store::*;

mod number;
pub use number::*;

mod snapshot;
pub use snapshot::*;
