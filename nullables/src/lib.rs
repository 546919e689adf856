//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the pool (wall clock, storage) are abstracted
//! behind traits. This crate provides test-friendly implementations that
//! return deterministic values, can be controlled programmatically, and
//! never touch the filesystem.

pub mod clock;
pub mod store;

pub use clock::{Clock, NullClock, SystemClock};
pub use store::NullStore;
