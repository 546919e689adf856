//! Staking — deposits against insured contracts, their unlock schedule and
//! the burn engine that slashes them when a claim is paid.
//!
//! Every deposit is an append-only record. Only two counters move after
//! creation, and both only grow:
//! - `burned`: principal destroyed by claim payouts
//! - `withdrawn`: principal returned to the staker by the unlock curve
//!
//! `burned + withdrawn <= amount` holds for every deposit at all times.
//!
//! Deposits on one insured contract form a single FIFO queue across all
//! stakers. Burns consume that queue oldest-first from a per-contract cursor.

pub mod burn;
pub mod curve;
pub mod deposit;
pub mod error;
pub mod ledger;

pub use burn::{BurnReceipt, BurnSlice};
pub use curve::UnlockCurve;
pub use deposit::StakeDeposit;
pub use error::StakingError;
pub use ledger::{ContractStakeIndex, StakingLedger};
