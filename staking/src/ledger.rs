//! The staking ledger — owns every deposit and the per-contract FIFO queues.

use crate::curve::UnlockCurve;
use crate::deposit::StakeDeposit;
use crate::error::StakingError;
use mutual_types::{BurnScope, ContractAddress, DepositId, MemberId, Timestamp, TokenAccount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deposits on one insured contract in creation order, plus the burn cursor.
///
/// Everything before `cursor` has no burnable principal left; burns start
/// scanning at `cursor`. New deposits are only ever appended, so they always
/// land after the cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStakeIndex {
    pub deposits: Vec<DepositId>,
    pub cursor: usize,
}

impl ContractStakeIndex {
    /// Deposits the next burn will consider.
    pub fn pending(&self) -> &[DepositId] {
        &self.deposits[self.cursor.min(self.deposits.len())..]
    }
}

/// Owns all stake deposits.
///
/// Deposit `n` lives at arena slot `n - 1`; ids are handed out in strictly
/// increasing order, which is also the global FIFO order for burns.
pub struct StakingLedger {
    pub(crate) curve: UnlockCurve,
    pub(crate) burn_scope: BurnScope,
    pub(crate) deposits: Vec<StakeDeposit>,
    pub(crate) contracts: BTreeMap<ContractAddress, ContractStakeIndex>,
    stakers: BTreeMap<MemberId, Vec<DepositId>>,
    /// Latest timestamp any mutation ran at. Time may not go backwards.
    pub(crate) last_activity: Timestamp,
}

impl StakingLedger {
    pub fn new(curve: UnlockCurve, burn_scope: BurnScope) -> Self {
        Self {
            curve,
            burn_scope,
            deposits: Vec::new(),
            contracts: BTreeMap::new(),
            stakers: BTreeMap::new(),
            last_activity: Timestamp::EPOCH,
        }
    }

    /// Rebuild a ledger from persisted deposits and burn cursors.
    ///
    /// Deposits must be given in id order with ids `1..=n`.
    pub fn restore(
        curve: UnlockCurve,
        burn_scope: BurnScope,
        deposits: Vec<StakeDeposit>,
        cursors: &BTreeMap<ContractAddress, usize>,
        last_activity: Timestamp,
    ) -> Result<Self, StakingError> {
        let mut ledger = Self::new(curve, burn_scope);
        for (slot, deposit) in deposits.into_iter().enumerate() {
            let expected = slot as u64 + 1;
            if deposit.id.raw() != expected {
                return Err(StakingError::Corrupt(format!(
                    "expected deposit #{expected}, found {}",
                    deposit.id
                )));
            }
            if !deposit.is_consistent() {
                return Err(StakingError::Corrupt(format!(
                    "{} has burned {} + withdrawn {} > amount {}",
                    deposit.id, deposit.burned, deposit.withdrawn, deposit.amount
                )));
            }
            ledger.index(&deposit);
            ledger.deposits.push(deposit);
        }
        for (contract, &cursor) in cursors {
            let index = ledger.contracts.get_mut(contract).ok_or_else(|| {
                StakingError::Corrupt(format!("cursor for unknown contract {contract}"))
            })?;
            if cursor > index.deposits.len() {
                return Err(StakingError::Corrupt(format!(
                    "cursor {cursor} past end of {contract} queue"
                )));
            }
            index.cursor = cursor;
        }
        ledger.last_activity = last_activity;
        Ok(ledger)
    }

    /// Stake `amount` from `account` against `contract`.
    ///
    /// Appends a new deposit to the end of the contract's global queue.
    pub fn stake(
        &mut self,
        staker: &MemberId,
        account: &mut TokenAccount,
        contract: &ContractAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<&StakeDeposit, StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        self.check_time(now)?;
        account.ensure_can_debit(amount)?;

        let id = DepositId::new(self.deposits.len() as u64 + 1);
        account.debit(amount)?;
        let deposit = StakeDeposit::new(id, staker.clone(), contract.clone(), amount, now);
        self.index(&deposit);
        self.deposits.push(deposit);
        self.last_activity = now;

        tracing::info!(
            staker = %staker,
            contract = %contract,
            deposit = %id,
            amount,
            "stake deposited"
        );
        Ok(&self.deposits[self.deposits.len() - 1])
    }

    /// Principal at risk for (staker, contract): Σ `amount − burned`.
    ///
    /// Unlocked-and-withdrawn principal is still counted; see
    /// [`still_staked`](Self::still_staked) for the net figure.
    pub fn total_staked(&self, staker: &MemberId, contract: &ContractAddress) -> u128 {
        self.deposits_of(staker)
            .filter(|d| &d.insured_contract == contract)
            .fold(0u128, |acc, d| acc.saturating_add(d.unburned()))
    }

    /// Σ `amount − burned − withdrawn` for (staker, contract).
    pub fn still_staked(&self, staker: &MemberId, contract: &ContractAddress) -> u128 {
        self.deposits_of(staker)
            .filter(|d| &d.insured_contract == contract)
            .fold(0u128, |acc, d| acc.saturating_add(d.still_staked()))
    }

    /// What `unlock_staker_unlockable_tokens` would pay out at `now`.
    pub fn unlockable_amount(&self, staker: &MemberId, now: Timestamp) -> Result<u128, StakingError> {
        self.deposits_of(staker).try_fold(0u128, |acc, d| {
            acc.checked_add(self.curve.net_unlockable(d, now)?)
                .ok_or(StakingError::Overflow)
        })
    }

    /// Unlockable amount of one (staker, contract) pair at `now`.
    pub fn unlockable_on(
        &self,
        staker: &MemberId,
        contract: &ContractAddress,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        self.deposits_of(staker)
            .filter(|d| &d.insured_contract == contract)
            .try_fold(0u128, |acc, d| {
                acc.checked_add(self.curve.net_unlockable(d, now)?)
                    .ok_or(StakingError::Overflow)
            })
    }

    /// Withdraw everything the curve has unlocked across all of `staker`'s
    /// deposits, crediting `account`. Returns the amount credited.
    ///
    /// Reads the latest `burned` of every deposit, so a burn applied at the
    /// same instant has already shrunk what is paid out.
    pub fn unlock_staker_unlockable_tokens(
        &mut self,
        staker: &MemberId,
        account: &mut TokenAccount,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        self.check_time(now)?;
        let mut payouts: Vec<(usize, u128)> = Vec::new();
        let mut total = 0u128;
        if let Some(ids) = self.stakers.get(staker) {
            for id in ids {
                let slot = Self::slot(*id);
                let deposit = &self.deposits[slot];
                let net = self.curve.net_unlockable(deposit, now)?;
                if net > 0 {
                    total = total.checked_add(net).ok_or(StakingError::Overflow)?;
                    payouts.push((slot, net));
                }
            }
        }
        if total == 0 {
            tracing::debug!(staker = %staker, "no unlockable stake");
            return Ok(0);
        }

        account.credit(total)?;
        for (slot, net) in payouts {
            let deposit = &mut self.deposits[slot];
            deposit.withdrawn += net;
            debug_assert!(deposit.is_consistent());
        }
        self.last_activity = now;
        tracing::info!(staker = %staker, amount = total, "unlocked staked tokens");
        Ok(total)
    }

    /// Burnable principal across the contract's pending queue at `now`.
    pub fn burnable(&self, contract: &ContractAddress, now: Timestamp) -> Result<u128, StakingError> {
        let Some(index) = self.contracts.get(contract) else {
            return Ok(0);
        };
        index.pending().iter().try_fold(0u128, |acc, id| {
            let deposit = &self.deposits[Self::slot(*id)];
            acc.checked_add(self.curve.burnable(deposit, now, self.burn_scope)?)
                .ok_or(StakingError::Overflow)
        })
    }

    pub fn deposit(&self, id: DepositId) -> Result<&StakeDeposit, StakingError> {
        if id.raw() == 0 {
            return Err(StakingError::DepositNotFound(0));
        }
        self.deposits
            .get(Self::slot(id))
            .ok_or(StakingError::DepositNotFound(id.raw()))
    }

    /// Every deposit of `staker`, oldest first.
    pub fn deposits_of<'a>(&'a self, staker: &MemberId) -> impl Iterator<Item = &'a StakeDeposit> {
        self.stakers
            .get(staker)
            .into_iter()
            .flatten()
            .map(|id| &self.deposits[Self::slot(*id)])
    }

    /// Every deposit on `contract`, in global FIFO order.
    pub fn deposits_on<'a>(
        &'a self,
        contract: &ContractAddress,
    ) -> impl Iterator<Item = &'a StakeDeposit> {
        self.contracts
            .get(contract)
            .map(|index| index.deposits.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|id| &self.deposits[Self::slot(*id)])
    }

    /// Contracts `staker` has ever staked on, without duplicates.
    pub fn staked_contracts(&self, staker: &MemberId) -> Vec<ContractAddress> {
        let mut contracts: Vec<ContractAddress> = self
            .deposits_of(staker)
            .map(|d| d.insured_contract.clone())
            .collect();
        contracts.sort();
        contracts.dedup();
        contracts
    }

    /// Distinct stakers on `contract` with their unburned principal.
    pub fn contract_stakers(&self, contract: &ContractAddress) -> BTreeMap<MemberId, u128> {
        let mut totals = BTreeMap::new();
        for deposit in self.deposits_on(contract) {
            let entry: &mut u128 = totals.entry(deposit.staker.clone()).or_default();
            *entry = entry.saturating_add(deposit.unburned());
        }
        totals
    }

    pub fn contract_index(&self, contract: &ContractAddress) -> Option<&ContractStakeIndex> {
        self.contracts.get(contract)
    }

    /// All deposits in id order.
    pub fn iter_deposits(&self) -> impl Iterator<Item = &StakeDeposit> {
        self.deposits.iter()
    }

    /// Burn cursor of every contract.
    pub fn cursors(&self) -> BTreeMap<ContractAddress, usize> {
        self.contracts
            .iter()
            .map(|(c, index)| (c.clone(), index.cursor))
            .collect()
    }

    pub fn deposit_count(&self) -> usize {
        self.deposits.len()
    }

    pub fn curve(&self) -> &UnlockCurve {
        &self.curve
    }

    pub fn burn_scope(&self) -> BurnScope {
        self.burn_scope
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// Reject `now` earlier than the latest mutation.
    pub fn check_time(&self, now: Timestamp) -> Result<(), StakingError> {
        if now < self.last_activity {
            return Err(StakingError::TimeWentBackwards {
                last: self.last_activity,
                now,
            });
        }
        Ok(())
    }

    pub(crate) fn slot(id: DepositId) -> usize {
        (id.raw() - 1) as usize
    }

    fn index(&mut self, deposit: &StakeDeposit) {
        self.contracts
            .entry(deposit.insured_contract.clone())
            .or_default()
            .deposits
            .push(deposit.id);
        self.stakers
            .entry(deposit.staker.clone())
            .or_default()
            .push(deposit.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutual_types::DAY_SECS;

    fn member(n: u8) -> MemberId {
        MemberId::new(format!("staker-{n}"))
    }

    fn contract(n: u8) -> ContractAddress {
        ContractAddress::new(format!("0x{:0>40}", n))
    }

    fn ledger() -> StakingLedger {
        StakingLedger::new(
            UnlockCurve::linear(250 * DAY_SECS).unwrap(),
            BurnScope::LockedPrincipal,
        )
    }

    #[test]
    fn stake_debits_and_appends() {
        let mut ledger = ledger();
        let mut acct = TokenAccount::new(5000);
        let d = ledger
            .stake(&member(1), &mut acct, &contract(1), 2000, Timestamp::from_days(1))
            .unwrap();
        assert_eq!(d.id, DepositId::new(1));
        assert_eq!(d.burned, 0);
        assert_eq!(acct.spendable, 3000);
        assert_eq!(ledger.total_staked(&member(1), &contract(1)), 2000);
        assert_eq!(ledger.contract_index(&contract(1)).unwrap().deposits.len(), 1);
    }

    #[test]
    fn stake_rejects_zero_and_overdraft() {
        let mut ledger = ledger();
        let mut acct = TokenAccount::new(100);
        assert_eq!(
            ledger
                .stake(&member(1), &mut acct, &contract(1), 0, Timestamp::EPOCH)
                .unwrap_err(),
            StakingError::InvalidAmount
        );
        assert!(matches!(
            ledger.stake(&member(1), &mut acct, &contract(1), 101, Timestamp::EPOCH),
            Err(StakingError::InsufficientBalance { needed: 101, available: 100 })
        ));
        assert_eq!(acct.spendable, 100);
        assert_eq!(ledger.deposit_count(), 0);
    }

    #[test]
    fn stake_rejects_time_regression() {
        let mut ledger = ledger();
        let mut acct = TokenAccount::new(100);
        ledger
            .stake(&member(1), &mut acct, &contract(1), 10, Timestamp::new(50))
            .unwrap();
        assert!(matches!(
            ledger.stake(&member(1), &mut acct, &contract(1), 10, Timestamp::new(49)),
            Err(StakingError::TimeWentBackwards { .. })
        ));
    }

    #[test]
    fn unlock_follows_curve_and_is_idempotent() {
        let mut ledger = ledger();
        let mut acct = TokenAccount::new(1000);
        ledger
            .stake(&member(1), &mut acct, &contract(1), 1000, Timestamp::EPOCH)
            .unwrap();
        assert_eq!(acct.spendable, 0);

        let at = Timestamp::from_days(50);
        assert_eq!(ledger.unlockable_amount(&member(1), at).unwrap(), 200);
        assert_eq!(
            ledger
                .unlock_staker_unlockable_tokens(&member(1), &mut acct, at)
                .unwrap(),
            200
        );
        assert_eq!(acct.spendable, 200);
        assert_eq!(
            ledger
                .unlock_staker_unlockable_tokens(&member(1), &mut acct, at)
                .unwrap(),
            0
        );
        assert_eq!(ledger.still_staked(&member(1), &contract(1)), 800);
        assert_eq!(ledger.total_staked(&member(1), &contract(1)), 1000);

        let end = Timestamp::from_days(300);
        ledger
            .unlock_staker_unlockable_tokens(&member(1), &mut acct, end)
            .unwrap();
        assert_eq!(acct.spendable, 1000);
        assert_eq!(ledger.still_staked(&member(1), &contract(1)), 0);
    }

    #[test]
    fn unlock_spans_all_contracts() {
        let mut ledger = ledger();
        let mut acct = TokenAccount::new(2000);
        ledger
            .stake(&member(1), &mut acct, &contract(1), 1000, Timestamp::EPOCH)
            .unwrap();
        ledger
            .stake(&member(1), &mut acct, &contract(2), 1000, Timestamp::EPOCH)
            .unwrap();
        let at = Timestamp::from_days(125);
        assert_eq!(ledger.unlockable_on(&member(1), &contract(2), at).unwrap(), 500);
        assert_eq!(
            ledger
                .unlock_staker_unlockable_tokens(&member(1), &mut acct, at)
                .unwrap(),
            1000
        );
        assert_eq!(ledger.staked_contracts(&member(1)), vec![contract(1), contract(2)]);
    }

    #[test]
    fn restore_rejects_gaps_and_bad_cursors() {
        let curve = UnlockCurve::linear(250 * DAY_SECS).unwrap();
        let d = StakeDeposit::new(
            DepositId::new(2),
            member(1),
            contract(1),
            10,
            Timestamp::EPOCH,
        );
        let err = StakingLedger::restore(
            curve.clone(),
            BurnScope::LockedPrincipal,
            vec![d],
            &BTreeMap::new(),
            Timestamp::EPOCH,
        )
        .err()
        .unwrap();
        assert!(matches!(err, StakingError::Corrupt(_)));

        let d = StakeDeposit::new(DepositId::new(1), member(1), contract(1), 10, Timestamp::EPOCH);
        let cursors = BTreeMap::from([(contract(1), 2usize)]);
        let err = StakingLedger::restore(
            curve,
            BurnScope::LockedPrincipal,
            vec![d],
            &cursors,
            Timestamp::EPOCH,
        )
        .err()
        .unwrap();
        assert!(matches!(err, StakingError::Corrupt(_)));
    }
}
