//! Scripted pool scenarios.
//!
//! A scenario is a JSON document with a list of steps. Each step runs one
//! pool operation at `day` days after the replay started:
//!
//! ```json
//! { "steps": [
//!     { "day": 0,  "action": { "admit": { "member": "alice" } } },
//!     { "day": 0,  "action": { "mint": { "member": "alice", "amount": 5000 } } },
//!     { "day": 20, "action": { "burn": { "contract": "0x…", "amount": "4000" } } }
//! ] }
//! ```
//!
//! Amounts may be JSON integers or decimal strings.

use std::path::Path;

use anyhow::{bail, Context, Result};
use mutual_nullables::NullClock;
use mutual_pool::{Caller, Pool, PoolError};
use mutual_types::{ClaimId, ContractAddress, CoverAsset, CoverId, LockReason, MemberId, DAY_SECS};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub day: u64,
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Admit {
        member: String,
    },
    Expel {
        member: String,
    },
    Mint {
        member: String,
        #[serde(with = "mutual_types::amount")]
        amount: u128,
    },
    Lock {
        member: String,
        reason: String,
        #[serde(with = "mutual_types::amount")]
        amount: u128,
        days: u64,
    },
    ExtendLock {
        member: String,
        reason: String,
        days: u64,
    },
    IncreaseLock {
        member: String,
        reason: String,
        #[serde(with = "mutual_types::amount")]
        amount: u128,
    },
    /// Runs as governance.
    ReduceLock {
        member: String,
        reason: String,
        days: u64,
    },
    Unlock {
        member: String,
    },
    Stake {
        member: String,
        contract: String,
        #[serde(with = "mutual_types::amount")]
        amount: u128,
    },
    UnlockStake {
        member: String,
    },
    /// Runs as the claims module.
    Burn {
        contract: String,
        #[serde(with = "mutual_types::amount")]
        amount: u128,
    },
    RegisterCover {
        owner: String,
        contract: String,
        #[serde(default)]
        asset: Option<CoverAsset>,
        #[serde(with = "mutual_types::amount")]
        sum_assured: u128,
        #[serde(with = "mutual_types::amount")]
        stake_burn: u128,
        valid_days: u64,
    },
    SubmitClaim {
        member: String,
        cover: u64,
    },
    AssessorVote {
        claim: u64,
        member: String,
        accept: bool,
    },
    CloseCaVote {
        claim: u64,
    },
    MemberVote {
        claim: u64,
        member: String,
        accept: bool,
    },
    CloseMemberVote {
        claim: u64,
    },
    Pause,
    Resume,
}

/// Result of one replayed step.
#[derive(Debug)]
pub struct StepRecord {
    pub index: usize,
    pub day: u64,
    pub result: Result<String, PoolError>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

fn reason(code: &str) -> Result<LockReason, PoolError> {
    LockReason::from_code(&code.to_ascii_uppercase())
        .ok_or_else(|| PoolError::Config(format!("unknown lock reason {code:?}")))
}

fn apply(pool: &mut Pool<NullClock>, action: &Action) -> Result<String, PoolError> {
    let id = |s: &String| MemberId::new(s.as_str());
    let contract = |s: &String| ContractAddress::new(s.as_str());
    Ok(match action {
        Action::Admit { member } => {
            pool.admit_member(&Caller::Governance, &id(member))?;
            format!("admitted {member}")
        }
        Action::Expel { member } => {
            pool.expel_member(&Caller::Governance, &id(member))?;
            format!("expelled {member}")
        }
        Action::Mint { member, amount } => {
            pool.mint(&Caller::Governance, &id(member), *amount)?;
            format!("minted {amount} to {member}")
        }
        Action::Lock {
            member,
            reason: code,
            amount,
            days,
        } => {
            let lock = pool.lock(&id(member), reason(code)?, *amount, days * DAY_SECS)?;
            format!("{member} locked {} until {}", lock.amount, lock.valid_until)
        }
        Action::ExtendLock {
            member,
            reason: code,
            days,
        } => {
            let lock = pool.extend_lock(&id(member), reason(code)?, days * DAY_SECS)?;
            format!("{member} {} lock now until {}", lock.reason, lock.valid_until)
        }
        Action::IncreaseLock {
            member,
            reason: code,
            amount,
        } => {
            let lock = pool.increase_lock_amount(&id(member), reason(code)?, *amount)?;
            format!("{member} {} lock now {}", lock.reason, lock.amount)
        }
        Action::ReduceLock {
            member,
            reason: code,
            days,
        } => {
            let lock = pool.reduce_lock(
                &Caller::Governance,
                &id(member),
                reason(code)?,
                days * DAY_SECS,
            )?;
            format!("{member} {} lock now until {}", lock.reason, lock.valid_until)
        }
        Action::Unlock { member } => {
            let released = pool.unlock(&id(member))?;
            format!("{member} released {released}")
        }
        Action::Stake {
            member,
            contract: c,
            amount,
        } => {
            let deposit = pool.stake(&id(member), &contract(c), *amount)?;
            format!("{member} staked {amount} on {c} as {deposit}")
        }
        Action::UnlockStake { member } => {
            let amount = pool.unlock_staker_unlockable_tokens(&id(member))?;
            format!("{member} withdrew {amount} of stake")
        }
        Action::Burn { contract: c, amount } => {
            let receipt = pool.burn(&Caller::Claims, &contract(c), *amount)?;
            format!(
                "burned {} on {c} from {} deposits, cursor {}",
                receipt.amount,
                receipt.slices.len(),
                receipt.cursor
            )
        }
        Action::RegisterCover {
            owner,
            contract: c,
            asset,
            sum_assured,
            stake_burn,
            valid_days,
        } => {
            let valid_until = pool.now().plus(valid_days * DAY_SECS);
            let cover = pool.register_cover(
                &id(owner),
                &contract(c),
                asset.clone().unwrap_or(CoverAsset::Eth),
                *sum_assured,
                *stake_burn,
                valid_until,
            )?;
            format!("registered {cover} for {owner}")
        }
        Action::SubmitClaim { member, cover } => {
            let claim = pool.submit_claim(&id(member), CoverId::new(*cover))?;
            format!("{member} submitted {claim}")
        }
        Action::AssessorVote {
            claim,
            member,
            accept,
        } => {
            pool.cast_assessor_vote(ClaimId::new(*claim), &id(member), *accept)?;
            format!("{member} voted {accept} as assessor")
        }
        Action::CloseCaVote { claim } => match pool.close_ca_vote(ClaimId::new(*claim))? {
            Some(outcome) => format!("claim#{claim} {outcome:?}"),
            None => format!("claim#{claim} escalated to member vote"),
        },
        Action::MemberVote {
            claim,
            member,
            accept,
        } => {
            pool.cast_member_vote(ClaimId::new(*claim), &id(member), *accept)?;
            format!("{member} voted {accept} as member")
        }
        Action::CloseMemberVote { claim } => {
            let outcome = pool.close_member_vote(ClaimId::new(*claim))?;
            format!("claim#{claim} {outcome:?}")
        }
        Action::Pause => {
            pool.pause(&Caller::Governance)?;
            "paused".to_string()
        }
        Action::Resume => {
            pool.resume(&Caller::Governance)?;
            "resumed".to_string()
        }
    })
}

/// Run every step against `pool`. Step days count from the pool clock at the
/// start of the replay.
///
/// Without `keep_going` the first failing step aborts the replay.
pub fn replay(
    pool: &mut Pool<NullClock>,
    scenario: &Scenario,
    keep_going: bool,
) -> Result<Vec<StepRecord>> {
    let start = pool.now();
    let mut records = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        pool.clock()
            .set(start.plus(step.day.saturating_mul(DAY_SECS)).as_secs());
        let result = apply(pool, &step.action);
        match &result {
            Ok(summary) => tracing::debug!(step = index + 1, day = step.day, %summary, "step applied"),
            Err(e) if keep_going => {
                tracing::warn!(step = index + 1, day = step.day, error = %e, "step failed")
            }
            Err(e) => bail!("step {} (day {}) failed: {e}", index + 1, step.day),
        }
        records.push(StepRecord {
            index: index + 1,
            day: step.day,
            result,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutual_types::PoolParams;

    const FIXTURE: &str = r#"{
        "name": "fifo burn",
        "steps": [
            { "day": 0, "action": { "admit": { "member": "alice" } } },
            { "day": 0, "action": { "admit": { "member": "bob" } } },
            { "day": 0, "action": { "mint": { "member": "alice", "amount": 2500 } } },
            { "day": 0, "action": { "mint": { "member": "bob", "amount": "2500" } } },
            { "day": 0, "action": { "stake": { "member": "alice", "contract": "0x00000000000000000000000000000000000000aa", "amount": 2500 } } },
            { "day": 10, "action": { "stake": { "member": "bob", "contract": "0x00000000000000000000000000000000000000aa", "amount": 2500 } } },
            { "day": 20, "action": { "burn": { "contract": "0x00000000000000000000000000000000000000aa", "amount": 4000 } } }
        ]
    }"#;

    fn pool() -> Pool<NullClock> {
        Pool::new(PoolParams::default(), NullClock::new(0)).unwrap()
    }

    #[test]
    fn replays_fifo_fixture() {
        let scenario = Scenario::from_json(FIXTURE).unwrap();
        let mut pool = pool();
        let records = replay(&mut pool, &scenario, false).unwrap();
        assert_eq!(records.len(), 7);
        let alice = MemberId::new("alice");
        let bob = MemberId::new("bob");
        let c = ContractAddress::new("0x00000000000000000000000000000000000000aa");
        assert_eq!(pool.total_staked(&alice, &c), 200);
        assert_eq!(pool.total_staked(&bob, &c), 800);
    }

    #[test]
    fn failing_step_aborts_unless_keep_going() {
        let raw = r#"{ "steps": [
            { "action": { "mint": { "member": "ghost", "amount": 1 } } },
            { "action": "pause" }
        ] }"#;
        let scenario = Scenario::from_json(raw).unwrap();
        assert!(replay(&mut pool(), &scenario, false).is_err());

        let mut pool = pool();
        let records = replay(&mut pool, &scenario, true).unwrap();
        assert!(matches!(records[0].result, Err(PoolError::NotAMember(_))));
        assert!(records[1].result.is_ok());
        assert!(pool.is_paused());
    }

    #[test]
    fn unknown_lock_reason_is_reported() {
        assert!(matches!(reason("XYZ"), Err(PoolError::Config(_))));
        assert_eq!(reason("cla").unwrap(), LockReason::ClaimsAssessment);
    }
}
