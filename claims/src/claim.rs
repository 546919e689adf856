//! Claim records and their phases.

use mutual_types::{ClaimId, CoverId, MemberId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Recorded, assessor voting not open yet.
    Submitted,
    /// Claims assessors are voting.
    UnderCaVoting,
    /// Assessors (or members) accepted; the burn is pending.
    Accepted,
    /// Assessors (or members) denied, or the member vote timed out.
    Denied,
    /// Assessors could not settle it; waiting for the first member vote.
    EscalatedToMemberVote,
    /// Members are voting.
    MemberVoting,
    /// The outcome has been applied.
    Closed,
}

impl ClaimStatus {
    /// Still collecting votes.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::UnderCaVoting | Self::EscalatedToMemberVote | Self::MemberVoting
        )
    }

    /// Resolved but not yet applied by the pool.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Accepted | Self::Denied)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOutcome {
    Accepted,
    Denied,
    /// Member vote closed without a single vote. Treated as a denial.
    TimedOut,
}

impl ClaimOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessorVote {
    pub assessor: MemberId,
    pub accept: bool,
    /// CLA tokens locked by the assessor when the vote was cast.
    pub weight: u128,
    pub cast_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberVote {
    pub member: MemberId,
    pub accept: bool,
    pub cast_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub cover: CoverId,
    pub claimant: MemberId,
    pub submitted_at: Timestamp,
    pub status: ClaimStatus,
    pub ca_votes: Vec<AssessorVote>,
    pub member_votes: Vec<MemberVote>,
    pub ca_closes_at: Timestamp,
    /// Set when the claim escalates to a member vote.
    pub member_closes_at: Option<Timestamp>,
    pub outcome: Option<ClaimOutcome>,
    /// Stake burned when the outcome was applied.
    pub burned: u128,
}

impl Claim {
    pub fn has_assessor_voted(&self, assessor: &MemberId) -> bool {
        self.ca_votes.iter().any(|v| &v.assessor == assessor)
    }

    pub fn has_member_voted(&self, member: &MemberId) -> bool {
        self.member_votes.iter().any(|v| &v.member == member)
    }
}
