//! Shared utilities for the mutual pool.

pub mod time;

pub use time::{format_duration, format_tokens};
