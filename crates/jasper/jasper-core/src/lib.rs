//! Lock-free per-security market state store.

pub mod snapshot;
pub mod store;

pub use snapshot::SecuritySnapshot;
pub use store::{SecurityStore, MAX_SECURITIES};
