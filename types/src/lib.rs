//! Fundamental types for the mutual risk pool.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! member and contract identifiers, record ids, timestamps, token accounts,
//! lock reasons, cover assets and the pool parameters.

pub mod account;
pub mod address;
pub mod amount;
pub mod asset;
pub mod error;
pub mod ids;
pub mod math;
pub mod params;
pub mod reason;
pub mod time;

pub use account::TokenAccount;
pub use address::{ContractAddress, MemberId};
pub use asset::CoverAsset;
pub use error::TypesError;
pub use ids::{ClaimId, CoverId, DepositId};
pub use params::{BurnScope, PoolParams, UnlockCurveParams};
pub use reason::LockReason;
pub use time::{Timestamp, DAY_SECS};
