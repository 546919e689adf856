//! Burn (slashing) engine.
//!
//! `burn(contract, total)` destroys staked principal from the contract's
//! queue oldest deposit first, whoever owns it. Each deposit gives up to its
//! burnable principal before the walk moves on. The walk is planned without
//! touching state and only applied once the full amount is covered, so a
//! short queue rejects the burn with no effect.

use crate::error::StakingError;
use crate::ledger::StakingLedger;
use mutual_types::{ContractAddress, DepositId, MemberId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Principal taken from one deposit by a burn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnSlice {
    pub deposit: DepositId,
    pub staker: MemberId,
    pub amount: u128,
}

/// Outcome of a successful burn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub contract: ContractAddress,
    pub amount: u128,
    pub burned_at: Timestamp,
    /// Touched deposits in the order they were consumed.
    pub slices: Vec<BurnSlice>,
    /// Queue position the next burn on this contract starts from.
    pub cursor: usize,
}

impl BurnReceipt {
    /// Amount burned per staker.
    pub fn per_staker(&self) -> BTreeMap<MemberId, u128> {
        let mut totals = BTreeMap::new();
        for slice in &self.slices {
            let entry: &mut u128 = totals.entry(slice.staker.clone()).or_default();
            *entry = entry.saturating_add(slice.amount);
        }
        totals
    }

    /// Amount taken from `deposit`, zero if it was not touched.
    pub fn burned_from(&self, deposit: DepositId) -> u128 {
        self.slices
            .iter()
            .filter(|s| s.deposit == deposit)
            .map(|s| s.amount)
            .sum()
    }
}

impl StakingLedger {
    /// Burn `amount` of staked principal on `contract` at `now`.
    pub fn burn(
        &mut self,
        contract: &ContractAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<BurnReceipt, StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        self.check_time(now)?;
        let insufficient = |available: u128| StakingError::InsufficientStake {
            contract: contract.clone(),
            requested: amount,
            available,
        };
        let Some(index) = self.contracts.get_mut(contract) else {
            return Err(insufficient(0));
        };

        // Plan: (queue position, deposit slot, take, burnable before take).
        let mut plan: Vec<(usize, usize, u128, u128)> = Vec::new();
        let mut still_needed = amount;
        for pos in index.cursor..index.deposits.len() {
            if still_needed == 0 {
                break;
            }
            let slot = Self::slot(index.deposits[pos]);
            let burnable = self
                .curve
                .burnable(&self.deposits[slot], now, self.burn_scope)?;
            let take = burnable.min(still_needed);
            still_needed -= take;
            plan.push((pos, slot, take, burnable));
        }
        if still_needed > 0 {
            let available = amount - still_needed;
            tracing::warn!(
                contract = %contract,
                requested = amount,
                available,
                "burn rejected: insufficient stake"
            );
            return Err(insufficient(available));
        }

        // Apply.
        let mut slices = Vec::new();
        let mut cursor = index.cursor;
        let mut exhausted_prefix = true;
        for (pos, slot, take, burnable) in plan {
            if take > 0 {
                let deposit = &mut self.deposits[slot];
                deposit.burned += take;
                debug_assert!(deposit.is_consistent());
                tracing::debug!(
                    deposit = %deposit.id,
                    staker = %deposit.staker,
                    amount = take,
                    "deposit burned"
                );
                slices.push(BurnSlice {
                    deposit: deposit.id,
                    staker: deposit.staker.clone(),
                    amount: take,
                });
            }
            if exhausted_prefix && burnable == take {
                cursor = pos + 1;
            } else {
                exhausted_prefix = false;
            }
        }
        index.cursor = cursor;
        self.last_activity = now;

        tracing::info!(
            contract = %contract,
            amount,
            deposits = slices.len(),
            cursor,
            "stake burned"
        );
        Ok(BurnReceipt {
            contract: contract.clone(),
            amount,
            burned_at: now,
            slices,
            cursor,
        })
    }
}
