//! Lock registry — time-bounded token locks keyed by (holder, reason).
//!
//! A lock takes tokens out of the holder's spendable balance until its
//! `valid_until` passes. Expired locks stay in the table until `unlock`
//! credits them back; they no longer count as locked in any query.

pub mod error;
pub mod lock;
pub mod registry;

pub use error::LockError;
pub use lock::TokenLock;
pub use registry::LockRegistry;
