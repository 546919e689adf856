//! Vote tallies and assessor reward shares.
//!
//! Assessor votes are weighted by the voter's locked CLA tokens; member votes
//! count one per member.

use crate::claim::{AssessorVote, ClaimOutcome, MemberVote};
use crate::error::ClaimError;
use mutual_types::math::wide_sum;
use mutual_types::params::BPS_DENOMINATOR;
use mutual_types::MemberId;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Result of closing assessor voting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaVerdict {
    Accept,
    Deny,
    /// Quorum missed or neither side reached the threshold.
    Escalate,
}

/// An assessor who voted with the final outcome, and its share of the
/// reward pool for the claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessorReward {
    pub assessor: MemberId,
    pub weight: u128,
    pub share_bps: u32,
}

/// `part / total >= threshold_bps / 10_000`, without division.
fn reaches(part: u128, total: u128, threshold_bps: u32) -> Result<bool, ClaimError> {
    let lhs = part
        .checked_mul(u128::from(BPS_DENOMINATOR))
        .ok_or(ClaimError::Overflow)?;
    let rhs = total
        .checked_mul(u128::from(threshold_bps))
        .ok_or(ClaimError::Overflow)?;
    Ok(lhs >= rhs)
}

pub fn tally_assessors(
    votes: &[AssessorVote],
    quorum: u128,
    threshold_bps: u32,
) -> Result<CaVerdict, ClaimError> {
    let (mut accept, mut deny) = (0u128, 0u128);
    for vote in votes {
        let side = if vote.accept { &mut accept } else { &mut deny };
        *side = side.checked_add(vote.weight).ok_or(ClaimError::Overflow)?;
    }
    let total = accept.checked_add(deny).ok_or(ClaimError::Overflow)?;
    if total == 0 || total < quorum {
        return Ok(CaVerdict::Escalate);
    }
    if reaches(accept, total, threshold_bps)? {
        Ok(CaVerdict::Accept)
    } else if reaches(deny, total, threshold_bps)? {
        Ok(CaVerdict::Deny)
    } else {
        Ok(CaVerdict::Escalate)
    }
}

pub fn tally_members(votes: &[MemberVote], threshold_bps: u32) -> Result<ClaimOutcome, ClaimError> {
    if votes.is_empty() {
        return Ok(ClaimOutcome::TimedOut);
    }
    let accept = votes.iter().filter(|v| v.accept).count() as u128;
    if reaches(accept, votes.len() as u128, threshold_bps)? {
        Ok(ClaimOutcome::Accepted)
    } else {
        Ok(ClaimOutcome::Denied)
    }
}

/// Reward shares for assessors whose vote matched the final outcome,
/// proportional to their locked weight.
pub fn assessor_rewards(votes: &[AssessorVote], accepted: bool) -> Vec<AssessorReward> {
    let winners: Vec<&AssessorVote> = votes.iter().filter(|v| v.accept == accepted).collect();
    let total = wide_sum(winners.iter().map(|v| v.weight));
    if total == BigUint::from(0u8) {
        return Vec::new();
    }
    let denominator = BigUint::from(BPS_DENOMINATOR);
    winners
        .into_iter()
        .map(|v| {
            // weight <= total, so the share fits in bps.
            let share = BigUint::from(v.weight) * &denominator / &total;
            AssessorReward {
                assessor: v.assessor.clone(),
                weight: v.weight,
                share_bps: u32::try_from(share).unwrap_or(BPS_DENOMINATOR),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutual_types::Timestamp;

    fn ca(name: &str, accept: bool, weight: u128) -> AssessorVote {
        AssessorVote {
            assessor: MemberId::new(name),
            accept,
            weight,
            cast_at: Timestamp::EPOCH,
        }
    }

    fn member(name: &str, accept: bool) -> MemberVote {
        MemberVote {
            member: MemberId::new(name),
            accept,
            cast_at: Timestamp::EPOCH,
        }
    }

    #[test]
    fn weighted_accept_above_threshold() {
        let votes = [ca("a", true, 700), ca("b", false, 300)];
        assert_eq!(tally_assessors(&votes, 1, 7000).unwrap(), CaVerdict::Accept);
    }

    #[test]
    fn weighted_deny_above_threshold() {
        let votes = [ca("a", true, 100), ca("b", false, 900)];
        assert_eq!(tally_assessors(&votes, 1, 7000).unwrap(), CaVerdict::Deny);
    }

    #[test]
    fn split_vote_escalates() {
        let votes = [ca("a", true, 600), ca("b", false, 400)];
        assert_eq!(tally_assessors(&votes, 1, 7000).unwrap(), CaVerdict::Escalate);
    }

    #[test]
    fn missed_quorum_escalates() {
        let votes = [ca("a", true, 50)];
        assert_eq!(tally_assessors(&votes, 100, 7000).unwrap(), CaVerdict::Escalate);
        assert_eq!(tally_assessors(&[], 0, 7000).unwrap(), CaVerdict::Escalate);
    }

    #[test]
    fn member_vote_is_one_per_member() {
        let votes = [member("a", true), member("b", true), member("c", false)];
        assert_eq!(tally_members(&votes, 5001).unwrap(), ClaimOutcome::Accepted);
        let tie = [member("a", true), member("b", false)];
        assert_eq!(tally_members(&tie, 5001).unwrap(), ClaimOutcome::Denied);
        assert_eq!(tally_members(&[], 5001).unwrap(), ClaimOutcome::TimedOut);
    }

    #[test]
    fn rewards_go_to_assessors_on_the_winning_side() {
        let votes = [ca("a", true, 300), ca("b", false, 200), ca("c", true, 100)];
        let rewards = assessor_rewards(&votes, true);
        assert_eq!(rewards.len(), 2);
        assert_eq!(rewards[0].assessor, MemberId::new("a"));
        assert_eq!(rewards[0].share_bps, 7500);
        assert_eq!(rewards[1].share_bps, 2500);
        assert!(assessor_rewards(&votes[1..2], true).is_empty());
    }

    #[test]
    fn reward_shares_are_exact_for_large_weights() {
        let weight = u128::MAX / 4;
        let votes = [ca("a", true, weight), ca("b", true, weight)];
        let rewards = assessor_rewards(&votes, true);
        assert_eq!(rewards[0].share_bps, 5000);
        assert_eq!(rewards[1].share_bps, 5000);
    }

    #[test]
    fn reward_shares_survive_weights_summing_past_u128() {
        let votes = [ca("a", true, u128::MAX), ca("b", true, u128::MAX)];
        let rewards = assessor_rewards(&votes, true);
        assert!(rewards.iter().all(|r| r.share_bps == 5000));
    }
}
