//! A single stake deposit.

use mutual_types::{ContractAddress, DepositId, MemberId, Timestamp};
use serde::{Deserialize, Serialize};

/// Principal a member committed against one insured contract at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeDeposit {
    pub id: DepositId,
    pub staker: MemberId,
    pub insured_contract: ContractAddress,
    /// Principal staked. Immutable.
    pub amount: u128,
    pub staked_at: Timestamp,
    /// Principal destroyed by burns (cumulative, never decreases).
    pub burned: u128,
    /// Principal returned to the staker through unlocks (cumulative, never decreases).
    pub withdrawn: u128,
}

impl StakeDeposit {
    pub fn new(
        id: DepositId,
        staker: MemberId,
        insured_contract: ContractAddress,
        amount: u128,
        staked_at: Timestamp,
    ) -> Self {
        Self {
            id,
            staker,
            insured_contract,
            amount,
            staked_at,
            burned: 0,
            withdrawn: 0,
        }
    }

    /// Principal not yet burned: the base the unlock curve applies to.
    pub fn unburned(&self) -> u128 {
        self.amount.saturating_sub(self.burned)
    }

    /// Principal neither burned nor withdrawn.
    pub fn still_staked(&self) -> u128 {
        self.unburned().saturating_sub(self.withdrawn)
    }

    /// Seconds since staking, as seen at `now`.
    pub fn age(&self, now: Timestamp) -> u64 {
        self.staked_at.elapsed_since(now)
    }

    /// `burned <= amount` and `burned + withdrawn <= amount`.
    pub fn is_consistent(&self) -> bool {
        self.burned <= self.amount
            && self
                .burned
                .checked_add(self.withdrawn)
                .is_some_and(|spent| spent <= self.amount)
    }
}
