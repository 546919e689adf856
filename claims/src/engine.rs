//! Claims engine: connects the cover book, assessor voting and member
//! escalation into one claim lifecycle.

use crate::claim::{AssessorVote, Claim, ClaimOutcome, ClaimStatus, MemberVote};
use crate::cover::{Cover, CoverBook};
use crate::error::ClaimError;
use crate::voting::{assessor_rewards, tally_assessors, tally_members, AssessorReward, CaVerdict};
use mutual_types::{
    ClaimId, ContractAddress, CoverAsset, CoverId, MemberId, PoolParams, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The assessor's CLA lock as seen by the caller when the vote is cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssessorStake {
    pub locked: u128,
    pub valid_until: Timestamp,
}

/// A claim that reached a verdict and is waiting for the caller to apply it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResolution {
    pub claim: ClaimId,
    pub cover: CoverId,
    pub insured_contract: ContractAddress,
    pub outcome: ClaimOutcome,
    /// Stake the cover puts at risk. Only burned when accepted.
    pub stake_burn: u128,
}

/// Events emitted by the engine for the pool to forward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimEvent {
    CoverRegistered {
        cover: CoverId,
        owner: MemberId,
        insured_contract: ContractAddress,
    },
    ClaimSubmitted {
        claim: ClaimId,
        cover: CoverId,
        claimant: MemberId,
    },
    CaVotingOpened {
        claim: ClaimId,
        closes_at: Timestamp,
    },
    AssessorVoted {
        claim: ClaimId,
        assessor: MemberId,
        accept: bool,
        weight: u128,
    },
    ClaimEscalated {
        claim: ClaimId,
        member_closes_at: Timestamp,
    },
    MemberVoted {
        claim: ClaimId,
        member: MemberId,
        accept: bool,
    },
    ClaimResolved {
        claim: ClaimId,
        outcome: ClaimOutcome,
    },
    /// Assessors who voted with the outcome accrue rewards by locked weight.
    AssessorRewardsAccrued {
        claim: ClaimId,
        rewards: Vec<AssessorReward>,
    },
    ClaimClosed {
        claim: ClaimId,
        burned: u128,
    },
}

#[derive(Debug, Default)]
pub struct ClaimsEngine {
    covers: CoverBook,
    claims: BTreeMap<ClaimId, Claim>,
    next_claim_id: u64,
    pending_events: Vec<ClaimEvent>,
}

impl ClaimsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the engine from persisted covers and claims.
    pub fn restore(
        covers: impl IntoIterator<Item = Cover>,
        claims: impl IntoIterator<Item = Claim>,
    ) -> Self {
        let claims: BTreeMap<ClaimId, Claim> = claims.into_iter().map(|c| (c.id, c)).collect();
        let next_claim_id = claims.keys().next_back().map(|id| id.raw()).unwrap_or(0);
        Self {
            covers: CoverBook::from_covers(covers),
            claims,
            next_claim_id,
            pending_events: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn register_cover(
        &mut self,
        owner: &MemberId,
        insured_contract: &ContractAddress,
        asset: CoverAsset,
        sum_assured: u128,
        stake_burn: u128,
        valid_until: Timestamp,
        now: Timestamp,
    ) -> Result<CoverId, ClaimError> {
        let cover = self.covers.register(
            owner.clone(),
            insured_contract.clone(),
            asset,
            sum_assured,
            stake_burn,
            valid_until,
            now,
        )?;
        let id = cover.id;
        tracing::info!(
            cover = %id,
            owner = %owner,
            contract = %insured_contract,
            asset = %cover.asset,
            sum_assured,
            stake_burn,
            "cover registered"
        );
        self.pending_events.push(ClaimEvent::CoverRegistered {
            cover: id,
            owner: owner.clone(),
            insured_contract: insured_contract.clone(),
        });
        Ok(id)
    }

    /// File a claim against `cover`. Assessor voting opens immediately.
    pub fn submit_claim(
        &mut self,
        claimant: &MemberId,
        cover_id: CoverId,
        now: Timestamp,
        params: &PoolParams,
    ) -> Result<ClaimId, ClaimError> {
        let cover = self.covers.get(cover_id)?;
        if &cover.owner != claimant {
            return Err(ClaimError::NotCoverOwner {
                member: claimant.clone(),
                cover: cover_id,
            });
        }
        if cover.paid {
            return Err(ClaimError::CoverAlreadyPaid(cover_id));
        }
        if !cover.accepts_claims(now, params.claim_grace_secs) {
            return Err(ClaimError::CoverExpired {
                cover: cover_id,
                valid_until: cover.valid_until,
            });
        }
        if let Some(open) = self
            .claims_of_cover(cover_id)
            .find(|c| c.status != ClaimStatus::Closed)
        {
            return Err(ClaimError::ClaimAlreadyOpen {
                cover: cover_id,
                claim: open.id,
            });
        }
        if self.claims_of_cover(cover_id).count() >= params.max_claims_per_cover as usize {
            return Err(ClaimError::MaxClaimsReached {
                cover: cover_id,
                max: params.max_claims_per_cover,
            });
        }

        self.next_claim_id += 1;
        let id = ClaimId::new(self.next_claim_id);
        let mut claim = Claim {
            id,
            cover: cover_id,
            claimant: claimant.clone(),
            submitted_at: now,
            status: ClaimStatus::Submitted,
            ca_votes: Vec::new(),
            member_votes: Vec::new(),
            ca_closes_at: now.plus(params.ca_voting_secs),
            member_closes_at: None,
            outcome: None,
            burned: 0,
        };
        self.pending_events.push(ClaimEvent::ClaimSubmitted {
            claim: id,
            cover: cover_id,
            claimant: claimant.clone(),
        });

        claim.status = ClaimStatus::UnderCaVoting;
        self.pending_events.push(ClaimEvent::CaVotingOpened {
            claim: id,
            closes_at: claim.ca_closes_at,
        });
        tracing::info!(
            claim = %id,
            cover = %cover_id,
            claimant = %claimant,
            ca_closes_at = claim.ca_closes_at.as_secs(),
            "claim submitted"
        );
        self.claims.insert(id, claim);
        Ok(id)
    }

    /// Record an assessor's vote, weighted by its CLA lock.
    ///
    /// The lock must be at least `ca_min_lock` and still active when
    /// assessor voting closes.
    pub fn cast_assessor_vote(
        &mut self,
        claim_id: ClaimId,
        assessor: &MemberId,
        accept: bool,
        stake: AssessorStake,
        now: Timestamp,
        params: &PoolParams,
    ) -> Result<(), ClaimError> {
        let claim = self.claim_mut(claim_id)?;
        if claim.status != ClaimStatus::UnderCaVoting {
            return Err(ClaimError::WrongPhase {
                claim: claim_id,
                status: claim.status,
            });
        }
        if now >= claim.ca_closes_at {
            return Err(ClaimError::VotingClosed {
                claim: claim_id,
                closed_at: claim.ca_closes_at,
            });
        }
        if claim.has_assessor_voted(assessor) {
            return Err(ClaimError::AlreadyVoted {
                claim: claim_id,
                voter: assessor.clone(),
            });
        }
        if stake.locked < params.ca_min_lock || stake.valid_until <= claim.ca_closes_at {
            return Err(ClaimError::InsufficientLock {
                assessor: assessor.clone(),
                needed: params.ca_min_lock,
                locked: stake.locked,
                until: claim.ca_closes_at,
            });
        }

        claim.ca_votes.push(AssessorVote {
            assessor: assessor.clone(),
            accept,
            weight: stake.locked,
            cast_at: now,
        });
        tracing::info!(claim = %claim_id, assessor = %assessor, accept, weight = stake.locked, "assessor voted");
        self.pending_events.push(ClaimEvent::AssessorVoted {
            claim: claim_id,
            assessor: assessor.clone(),
            accept,
            weight: stake.locked,
        });
        Ok(())
    }

    /// Close assessor voting once its deadline has passed.
    ///
    /// Returns the resolution when assessors settled the claim, `None` when
    /// it escalated to a member vote.
    pub fn close_ca_vote(
        &mut self,
        claim_id: ClaimId,
        now: Timestamp,
        params: &PoolParams,
    ) -> Result<Option<ClaimResolution>, ClaimError> {
        match self.ca_verdict(claim_id, now, params)? {
            CaVerdict::Accept => self.resolve(claim_id, ClaimOutcome::Accepted).map(Some),
            CaVerdict::Deny => self.resolve(claim_id, ClaimOutcome::Denied).map(Some),
            CaVerdict::Escalate => {
                let member_closes_at = now.plus(params.member_voting_secs);
                let claim = self.claim_mut(claim_id)?;
                claim.status = ClaimStatus::EscalatedToMemberVote;
                claim.member_closes_at = Some(member_closes_at);
                tracing::info!(
                    claim = %claim_id,
                    member_closes_at = member_closes_at.as_secs(),
                    "claim escalated to member vote"
                );
                self.pending_events.push(ClaimEvent::ClaimEscalated {
                    claim: claim_id,
                    member_closes_at,
                });
                Ok(None)
            }
        }
    }

    /// Tally of a claim whose assessor voting has ended, without changing
    /// it. Fails like [`Self::close_ca_vote`] would.
    pub fn ca_verdict(
        &self,
        claim_id: ClaimId,
        now: Timestamp,
        params: &PoolParams,
    ) -> Result<CaVerdict, ClaimError> {
        let claim = self.claim(claim_id)?;
        if claim.status != ClaimStatus::UnderCaVoting {
            return Err(ClaimError::WrongPhase {
                claim: claim_id,
                status: claim.status,
            });
        }
        if now < claim.ca_closes_at {
            return Err(ClaimError::VotingStillOpen {
                claim: claim_id,
                closes_at: claim.ca_closes_at,
            });
        }
        tally_assessors(&claim.ca_votes, params.ca_quorum, params.ca_threshold_bps)
    }

    /// Outcome of a claim whose member voting has ended, without changing
    /// it.
    pub fn member_outcome(
        &self,
        claim_id: ClaimId,
        now: Timestamp,
        params: &PoolParams,
    ) -> Result<ClaimOutcome, ClaimError> {
        let claim = self.claim(claim_id)?;
        let closes_at = match (claim.status, claim.member_closes_at) {
            (ClaimStatus::EscalatedToMemberVote | ClaimStatus::MemberVoting, Some(at)) => at,
            (status, _) => return Err(ClaimError::WrongPhase { claim: claim_id, status }),
        };
        if now < closes_at {
            return Err(ClaimError::VotingStillOpen {
                claim: claim_id,
                closes_at,
            });
        }
        tally_members(&claim.member_votes, params.member_threshold_bps)
    }

    /// What resolving `claim_id` with `outcome` would hand back to the
    /// caller.
    pub fn pending_resolution(
        &self,
        claim_id: ClaimId,
        outcome: ClaimOutcome,
    ) -> Result<ClaimResolution, ClaimError> {
        let cover_id = self.claim(claim_id)?.cover;
        let cover = self.covers.get(cover_id)?;
        Ok(ClaimResolution {
            claim: claim_id,
            cover: cover_id,
            insured_contract: cover.insured_contract.clone(),
            outcome,
            stake_burn: cover.stake_burn,
        })
    }

    /// Record a member's vote on an escalated claim. One member, one vote.
    pub fn cast_member_vote(
        &mut self,
        claim_id: ClaimId,
        member: &MemberId,
        accept: bool,
        now: Timestamp,
    ) -> Result<(), ClaimError> {
        let claim = self.claim_mut(claim_id)?;
        let closes_at = match (claim.status, claim.member_closes_at) {
            (ClaimStatus::EscalatedToMemberVote | ClaimStatus::MemberVoting, Some(at)) => at,
            (status, _) => return Err(ClaimError::WrongPhase { claim: claim_id, status }),
        };
        if now >= closes_at {
            return Err(ClaimError::VotingClosed {
                claim: claim_id,
                closed_at: closes_at,
            });
        }
        if claim.has_member_voted(member) {
            return Err(ClaimError::AlreadyVoted {
                claim: claim_id,
                voter: member.clone(),
            });
        }
        claim.member_votes.push(MemberVote {
            member: member.clone(),
            accept,
            cast_at: now,
        });
        claim.status = ClaimStatus::MemberVoting;
        tracing::info!(claim = %claim_id, member = %member, accept, "member voted");
        self.pending_events.push(ClaimEvent::MemberVoted {
            claim: claim_id,
            member: member.clone(),
            accept,
        });
        Ok(())
    }

    /// Close member voting once its deadline has passed. A vote nobody
    /// joined times out as a denial.
    pub fn close_member_vote(
        &mut self,
        claim_id: ClaimId,
        now: Timestamp,
        params: &PoolParams,
    ) -> Result<ClaimResolution, ClaimError> {
        let outcome = self.member_outcome(claim_id, now, params)?;
        self.resolve(claim_id, outcome)
    }

    /// Move a resolved claim to `Closed` once its outcome has been applied.
    pub fn mark_closed(&mut self, claim_id: ClaimId, burned: u128) -> Result<(), ClaimError> {
        let claim = self.claim_mut(claim_id)?;
        if !claim.status.is_resolved() {
            return Err(ClaimError::WrongPhase {
                claim: claim_id,
                status: claim.status,
            });
        }
        claim.status = ClaimStatus::Closed;
        claim.burned = burned;
        tracing::info!(claim = %claim_id, burned, "claim closed");
        self.pending_events.push(ClaimEvent::ClaimClosed {
            claim: claim_id,
            burned,
        });
        Ok(())
    }

    fn resolve(&mut self, claim_id: ClaimId, outcome: ClaimOutcome) -> Result<ClaimResolution, ClaimError> {
        let resolution = self.pending_resolution(claim_id, outcome)?;
        let accepted = outcome.is_accepted();
        if accepted {
            self.covers.get_mut(resolution.cover)?.paid = true;
        }
        let claim = self.claim_mut(claim_id)?;
        claim.status = if accepted {
            ClaimStatus::Accepted
        } else {
            ClaimStatus::Denied
        };
        claim.outcome = Some(outcome);
        let rewards = assessor_rewards(&claim.ca_votes, accepted);

        tracing::info!(claim = %claim_id, cover = %resolution.cover, ?outcome, "claim resolved");
        self.pending_events.push(ClaimEvent::ClaimResolved {
            claim: claim_id,
            outcome,
        });
        self.pending_events.push(ClaimEvent::AssessorRewardsAccrued {
            claim: claim_id,
            rewards,
        });
        Ok(resolution)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn claim(&self, id: ClaimId) -> Result<&Claim, ClaimError> {
        self.claims.get(&id).ok_or(ClaimError::ClaimNotFound(id))
    }

    fn claim_mut(&mut self, id: ClaimId) -> Result<&mut Claim, ClaimError> {
        self.claims.get_mut(&id).ok_or(ClaimError::ClaimNotFound(id))
    }

    pub fn cover(&self, id: CoverId) -> Result<&Cover, ClaimError> {
        self.covers.get(id)
    }

    pub fn covers(&self) -> &CoverBook {
        &self.covers
    }

    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    pub fn claims_of_cover(&self, cover: CoverId) -> impl Iterator<Item = &Claim> {
        self.claims.values().filter(move |c| c.cover == cover)
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<ClaimEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
