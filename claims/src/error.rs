use crate::claim::ClaimStatus;
use mutual_types::{ClaimId, CoverId, MemberId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("{0} not found")]
    CoverNotFound(CoverId),

    #[error("{0} not found")]
    ClaimNotFound(ClaimId),

    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("cover must expire after it is registered")]
    InvalidValidity,

    #[error("{member} does not own {cover}")]
    NotCoverOwner { member: MemberId, cover: CoverId },

    #[error("{cover} expired at {valid_until} and its grace period is over")]
    CoverExpired { cover: CoverId, valid_until: Timestamp },

    #[error("{cover} already has an open claim ({claim})")]
    ClaimAlreadyOpen { cover: CoverId, claim: ClaimId },

    #[error("{0} already had a claim accepted")]
    CoverAlreadyPaid(CoverId),

    #[error("{cover} reached the maximum of {max} claims")]
    MaxClaimsReached { cover: CoverId, max: u32 },

    #[error("{claim} is {status:?}, which does not allow this action")]
    WrongPhase { claim: ClaimId, status: ClaimStatus },

    #[error("voting on {claim} closed at {closed_at}")]
    VotingClosed { claim: ClaimId, closed_at: Timestamp },

    #[error("voting on {claim} is open until {closes_at}")]
    VotingStillOpen { claim: ClaimId, closes_at: Timestamp },

    #[error("{voter} already voted on {claim}")]
    AlreadyVoted { claim: ClaimId, voter: MemberId },

    #[error("{assessor} needs a CLA lock of {needed} valid past {until}, has {locked}")]
    InsufficientLock {
        assessor: MemberId,
        needed: u128,
        locked: u128,
        until: Timestamp,
    },

    #[error("arithmetic overflow in vote tally")]
    Overflow,
}
