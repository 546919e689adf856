//! Claims lifecycle for the mutual pool.
//!
//! A claim moves through assessor voting and, when assessors cannot settle
//! it, a member vote:
//!
//! `Submitted → UnderCaVoting → {Accepted | Denied | EscalatedToMemberVote}`
//! `EscalatedToMemberVote → MemberVoting → {Accepted | Denied}`
//! `{Accepted | Denied} → Closed`
//!
//! This crate owns only the claim and cover records. It never touches
//! balances: a resolved claim is handed back to the caller as a
//! [`ClaimResolution`], and the caller applies the burn and marks the claim
//! closed.

pub mod claim;
pub mod cover;
pub mod engine;
pub mod error;
pub mod voting;

pub use claim::{AssessorVote, Claim, ClaimOutcome, ClaimStatus, MemberVote};
pub use cover::{Cover, CoverBook};
pub use engine::{AssessorStake, ClaimEvent, ClaimResolution, ClaimsEngine};
pub use error::ClaimError;
pub use voting::{AssessorReward, CaVerdict};
