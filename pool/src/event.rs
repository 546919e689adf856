//! Events the pool emits for observers (notifiers, indexers, reports).

use mutual_claims::ClaimEvent;
use mutual_staking::BurnReceipt;
use mutual_types::{ContractAddress, DepositId, LockReason, MemberId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    MemberAdmitted {
        member: MemberId,
    },
    MemberExpelled {
        member: MemberId,
    },
    Minted {
        member: MemberId,
        amount: u128,
    },
    TokensLocked {
        holder: MemberId,
        reason: LockReason,
        amount: u128,
        valid_until: Timestamp,
    },
    LockChanged {
        holder: MemberId,
        reason: LockReason,
        amount: u128,
        valid_until: Timestamp,
    },
    TokensUnlocked {
        holder: MemberId,
        amount: u128,
    },
    Staked {
        deposit: DepositId,
        staker: MemberId,
        contract: ContractAddress,
        amount: u128,
    },
    StakeUnlocked {
        staker: MemberId,
        amount: u128,
    },
    StakeBurned(BurnReceipt),
    Claim(ClaimEvent),
    Paused,
    Resumed,
}
