//! The pool service.

use std::collections::BTreeMap;

use mutual_claims::{AssessorStake, CaVerdict, ClaimOutcome, ClaimResolution, ClaimsEngine};
use mutual_locks::{LockRegistry, TokenLock};
use mutual_nullables::{Clock, SystemClock};
use mutual_staking::{BurnReceipt, StakingLedger, UnlockCurve};
use mutual_types::{
    ClaimId, ContractAddress, CoverAsset, CoverId, DepositId, LockReason, MemberId, PoolParams,
    Timestamp, TokenAccount,
};

use crate::caller::Caller;
use crate::error::PoolError;
use crate::event::PoolEvent;
use crate::membership::{MemberRoll, Membership};

/// Single-writer owner of all pool state.
///
/// `now` comes from the clock `C`; every mutation rejects a clock that went
/// backwards relative to the last successful mutation of any kind.
pub struct Pool<C: Clock = SystemClock> {
    pub(crate) params: PoolParams,
    pub(crate) clock: C,
    pub(crate) accounts: BTreeMap<MemberId, TokenAccount>,
    pub(crate) members: MemberRoll,
    pub(crate) locks: LockRegistry,
    pub(crate) staking: StakingLedger,
    pub(crate) claims: ClaimsEngine,
    pub(crate) paused: bool,
    pub(crate) last_activity: Timestamp,
    pending_events: Vec<PoolEvent>,
}

impl<C: Clock> Pool<C> {
    /// An empty pool.
    pub fn new(params: PoolParams, clock: C) -> Result<Self, PoolError> {
        params.validate()?;
        let curve = UnlockCurve::new(&params.unlock_curve)?;
        let staking = StakingLedger::new(curve, params.burn_scope);
        Ok(Self::from_parts(
            params,
            clock,
            BTreeMap::new(),
            MemberRoll::new(),
            LockRegistry::new(),
            staking,
            ClaimsEngine::new(),
            false,
            Timestamp::EPOCH,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        params: PoolParams,
        clock: C,
        accounts: BTreeMap<MemberId, TokenAccount>,
        members: MemberRoll,
        locks: LockRegistry,
        staking: StakingLedger,
        claims: ClaimsEngine,
        paused: bool,
        last_activity: Timestamp,
    ) -> Self {
        Self {
            params,
            clock,
            accounts,
            members,
            locks,
            staking,
            claims,
            paused,
            last_activity,
            pending_events: Vec::new(),
        }
    }

    // ── Guards ───────────────────────────────────────────────────────────

    fn ensure_running(&self) -> Result<(), PoolError> {
        if self.paused {
            return Err(PoolError::Paused);
        }
        Ok(())
    }

    fn ensure_member(&self, id: &MemberId) -> Result<(), PoolError> {
        if !self.members.is_member(id) {
            return Err(PoolError::NotAMember(id.clone()));
        }
        Ok(())
    }

    fn authorize(&self, caller: &Caller, allowed: bool, action: &'static str) -> Result<(), PoolError> {
        if !allowed {
            tracing::warn!(caller = %caller, action, "unauthorized call rejected");
            return Err(PoolError::Unauthorized {
                caller: caller.clone(),
                action,
            });
        }
        Ok(())
    }

    /// Current time for a mutation.
    fn mutation_time(&self) -> Result<Timestamp, PoolError> {
        let now = self.clock.now();
        if now < self.last_activity {
            tracing::warn!(
                last = self.last_activity.as_secs(),
                now = now.as_secs(),
                "clock went backwards"
            );
            return Err(PoolError::TimeWentBackwards {
                last: self.last_activity,
                now,
            });
        }
        self.staking.check_time(now)?;
        Ok(now)
    }

    /// Record a successful mutation at `now`.
    fn touch(&mut self, now: Timestamp) {
        self.last_activity = now;
    }

    fn account_mut<'a>(
        accounts: &'a mut BTreeMap<MemberId, TokenAccount>,
        id: &MemberId,
    ) -> Result<&'a mut TokenAccount, PoolError> {
        accounts
            .get_mut(id)
            .ok_or_else(|| PoolError::NotAMember(id.clone()))
    }

    fn forward_claim_events(&mut self) {
        self.pending_events
            .extend(self.claims.drain_events().into_iter().map(PoolEvent::Claim));
    }

    // ── Lock registry ────────────────────────────────────────────────────

    pub fn lock(
        &mut self,
        holder: &MemberId,
        reason: LockReason,
        amount: u128,
        validity_secs: u64,
    ) -> Result<TokenLock, PoolError> {
        self.ensure_running()?;
        self.ensure_member(holder)?;
        let now = self.mutation_time()?;
        let account = Self::account_mut(&mut self.accounts, holder)?;
        let lock = self
            .locks
            .lock(holder, account, reason, amount, validity_secs, now)?
            .clone();
        self.pending_events.push(PoolEvent::TokensLocked {
            holder: holder.clone(),
            reason,
            amount: lock.amount,
            valid_until: lock.valid_until,
        });
        self.touch(now);
        Ok(lock)
    }

    pub fn extend_lock(
        &mut self,
        holder: &MemberId,
        reason: LockReason,
        extra_secs: u64,
    ) -> Result<TokenLock, PoolError> {
        self.ensure_running()?;
        self.ensure_member(holder)?;
        let now = self.mutation_time()?;
        let lock = self.locks.extend_lock(holder, reason, extra_secs, now)?.clone();
        self.push_lock_changed(&lock);
        self.touch(now);
        Ok(lock)
    }

    pub fn increase_lock_amount(
        &mut self,
        holder: &MemberId,
        reason: LockReason,
        extra_amount: u128,
    ) -> Result<TokenLock, PoolError> {
        self.ensure_running()?;
        self.ensure_member(holder)?;
        let now = self.mutation_time()?;
        let account = Self::account_mut(&mut self.accounts, holder)?;
        let lock = self
            .locks
            .increase_lock_amount(holder, account, reason, extra_amount, now)?
            .clone();
        self.push_lock_changed(&lock);
        self.touch(now);
        Ok(lock)
    }

    /// Shorten a member's lock. Only the claims and governance modules may
    /// do this.
    pub fn reduce_lock(
        &mut self,
        caller: &Caller,
        holder: &MemberId,
        reason: LockReason,
        new_duration_secs: u64,
    ) -> Result<TokenLock, PoolError> {
        self.ensure_running()?;
        self.authorize(
            caller,
            caller.is_claims() || caller.is_governance(),
            "reduce a lock",
        )?;
        let now = self.mutation_time()?;
        let lock = self
            .locks
            .reduce_lock(holder, reason, new_duration_secs, now)?
            .clone();
        self.push_lock_changed(&lock);
        self.touch(now);
        Ok(lock)
    }

    /// Release every expired lock of `holder`. Former members may still
    /// recover their tokens.
    pub fn unlock(&mut self, holder: &MemberId) -> Result<u128, PoolError> {
        self.ensure_running()?;
        let now = self.mutation_time()?;
        let account = Self::account_mut(&mut self.accounts, holder)?;
        let released = self.locks.unlock(holder, account, now)?;
        if released > 0 {
            self.pending_events.push(PoolEvent::TokensUnlocked {
                holder: holder.clone(),
                amount: released,
            });
        }
        self.touch(now);
        Ok(released)
    }

    pub fn locked_amount(&self, holder: &MemberId, reason: LockReason, at: Timestamp) -> u128 {
        self.locks.locked_amount(holder, reason, at)
    }

    pub fn tokens_locked_total(&self, holder: &MemberId) -> u128 {
        self.locks.tokens_locked_total(holder, self.clock.now())
    }

    fn push_lock_changed(&mut self, lock: &TokenLock) {
        self.pending_events.push(PoolEvent::LockChanged {
            holder: lock.holder.clone(),
            reason: lock.reason,
            amount: lock.amount,
            valid_until: lock.valid_until,
        });
    }

    // ── Staking ──────────────────────────────────────────────────────────

    pub fn stake(
        &mut self,
        staker: &MemberId,
        contract: &ContractAddress,
        amount: u128,
    ) -> Result<DepositId, PoolError> {
        self.ensure_running()?;
        self.ensure_member(staker)?;
        if !contract.is_valid() {
            return Err(PoolError::InvalidContract(contract.to_string()));
        }
        let now = self.mutation_time()?;
        let account = Self::account_mut(&mut self.accounts, staker)?;
        let deposit = self.staking.stake(staker, account, contract, amount, now)?.id;
        self.pending_events.push(PoolEvent::Staked {
            deposit,
            staker: staker.clone(),
            contract: contract.clone(),
            amount,
        });
        self.touch(now);
        Ok(deposit)
    }

    pub fn total_staked(&self, staker: &MemberId, contract: &ContractAddress) -> u128 {
        self.staking.total_staked(staker, contract)
    }

    pub fn still_staked(&self, staker: &MemberId, contract: &ContractAddress) -> u128 {
        self.staking.still_staked(staker, contract)
    }

    pub fn unlockable_amount(&self, staker: &MemberId) -> Result<u128, PoolError> {
        Ok(self.staking.unlockable_amount(staker, self.clock.now())?)
    }

    pub fn unlock_staker_unlockable_tokens(&mut self, staker: &MemberId) -> Result<u128, PoolError> {
        self.ensure_running()?;
        let now = self.mutation_time()?;
        let account = Self::account_mut(&mut self.accounts, staker)?;
        let amount = self
            .staking
            .unlock_staker_unlockable_tokens(staker, account, now)?;
        if amount > 0 {
            self.pending_events.push(PoolEvent::StakeUnlocked {
                staker: staker.clone(),
                amount,
            });
        }
        self.touch(now);
        Ok(amount)
    }

    // ── Burns ────────────────────────────────────────────────────────────

    /// Burn `amount` of stake on `contract`, oldest deposits first.
    /// Only the claims module may burn.
    pub fn burn(
        &mut self,
        caller: &Caller,
        contract: &ContractAddress,
        amount: u128,
    ) -> Result<BurnReceipt, PoolError> {
        self.ensure_running()?;
        self.authorize(caller, caller.is_claims(), "burn stake")?;
        let now = self.mutation_time()?;
        let receipt = self.staking.burn(contract, amount, now)?;
        self.pending_events
            .push(PoolEvent::StakeBurned(receipt.clone()));
        self.touch(now);
        Ok(receipt)
    }

    pub fn burnable(&self, contract: &ContractAddress) -> Result<u128, PoolError> {
        Ok(self.staking.burnable(contract, self.clock.now())?)
    }

    // ── Covers and claims ────────────────────────────────────────────────

    /// Record a cover sold by the quotation layer.
    pub fn register_cover(
        &mut self,
        owner: &MemberId,
        contract: &ContractAddress,
        asset: CoverAsset,
        sum_assured: u128,
        stake_burn: u128,
        valid_until: Timestamp,
    ) -> Result<CoverId, PoolError> {
        self.ensure_running()?;
        self.ensure_member(owner)?;
        if !contract.is_valid() {
            return Err(PoolError::InvalidContract(contract.to_string()));
        }
        let now = self.mutation_time()?;
        let id = self.claims.register_cover(
            owner,
            contract,
            asset,
            sum_assured,
            stake_burn,
            valid_until,
            now,
        )?;
        self.forward_claim_events();
        self.touch(now);
        Ok(id)
    }

    pub fn submit_claim(&mut self, claimant: &MemberId, cover: CoverId) -> Result<ClaimId, PoolError> {
        self.ensure_running()?;
        self.ensure_member(claimant)?;
        let now = self.mutation_time()?;
        let id = self.claims.submit_claim(claimant, cover, now, &self.params)?;
        self.forward_claim_events();
        self.touch(now);
        Ok(id)
    }

    /// Vote as a claims assessor. The vote weighs the assessor's CLA lock.
    pub fn cast_assessor_vote(
        &mut self,
        claim: ClaimId,
        assessor: &MemberId,
        accept: bool,
    ) -> Result<(), PoolError> {
        self.ensure_running()?;
        self.ensure_member(assessor)?;
        let now = self.mutation_time()?;
        let stake = self.assessor_stake(assessor, now);
        self.claims
            .cast_assessor_vote(claim, assessor, accept, stake, now, &self.params)?;
        self.forward_claim_events();
        self.touch(now);
        Ok(())
    }

    /// Close assessor voting. Returns the outcome when assessors settled
    /// the claim, `None` when it escalated to a member vote.
    ///
    /// The stake burn runs before the claim changes phase, so a failed burn
    /// leaves the claim open for another close.
    pub fn close_ca_vote(&mut self, claim: ClaimId) -> Result<Option<ClaimOutcome>, PoolError> {
        self.ensure_running()?;
        let now = self.mutation_time()?;
        let outcome = match self.claims.ca_verdict(claim, now, &self.params)? {
            CaVerdict::Accept => Some(ClaimOutcome::Accepted),
            CaVerdict::Deny => Some(ClaimOutcome::Denied),
            CaVerdict::Escalate => None,
        };
        let receipt = match outcome {
            Some(outcome) => self.burn_for_claim(claim, outcome, now)?,
            None => None,
        };
        if let Some(resolution) = self.claims.close_ca_vote(claim, now, &self.params)? {
            self.settle(resolution, receipt)?;
        }
        self.forward_claim_events();
        self.touch(now);
        Ok(outcome)
    }

    pub fn cast_member_vote(
        &mut self,
        claim: ClaimId,
        member: &MemberId,
        accept: bool,
    ) -> Result<(), PoolError> {
        self.ensure_running()?;
        self.ensure_member(member)?;
        let now = self.mutation_time()?;
        self.claims.cast_member_vote(claim, member, accept, now)?;
        self.forward_claim_events();
        self.touch(now);
        Ok(())
    }

    pub fn close_member_vote(&mut self, claim: ClaimId) -> Result<ClaimOutcome, PoolError> {
        self.ensure_running()?;
        let now = self.mutation_time()?;
        let outcome = self.claims.member_outcome(claim, now, &self.params)?;
        let receipt = self.burn_for_claim(claim, outcome, now)?;
        let resolution = self.claims.close_member_vote(claim, now, &self.params)?;
        let outcome = self.settle(resolution, receipt)?;
        self.forward_claim_events();
        self.touch(now);
        Ok(outcome)
    }

    fn assessor_stake(&self, assessor: &MemberId, now: Timestamp) -> AssessorStake {
        match self.locks.lock_of(assessor, LockReason::ClaimsAssessment) {
            Some(lock) if lock.is_active(now) => AssessorStake {
                locked: lock.amount,
                valid_until: lock.valid_until,
            },
            _ => AssessorStake {
                locked: 0,
                valid_until: now,
            },
        }
    }

    /// Burn the cover's stake liability for an accepted claim, capped by
    /// what is burnable on the insured contract. Leaves the claim as is.
    fn burn_for_claim(
        &mut self,
        claim: ClaimId,
        outcome: ClaimOutcome,
        now: Timestamp,
    ) -> Result<Option<BurnReceipt>, PoolError> {
        if !outcome.is_accepted() {
            return Ok(None);
        }
        let pending = self.claims.pending_resolution(claim, outcome)?;
        let available = self.staking.burnable(&pending.insured_contract, now)?;
        let amount = pending.stake_burn.min(available);
        if amount < pending.stake_burn {
            tracing::warn!(
                claim = %claim,
                contract = %pending.insured_contract,
                liability = pending.stake_burn,
                available,
                "stake burn capped by burnable stake"
            );
        }
        if amount == 0 {
            return Ok(None);
        }
        Ok(Some(self.staking.burn(&pending.insured_contract, amount, now)?))
    }

    /// Close a resolved claim with the burn already applied to it.
    fn settle(
        &mut self,
        resolution: ClaimResolution,
        receipt: Option<BurnReceipt>,
    ) -> Result<ClaimOutcome, PoolError> {
        self.forward_claim_events();
        let burned = receipt.as_ref().map_or(0, |r| r.amount);
        if let Some(receipt) = receipt {
            self.pending_events.push(PoolEvent::StakeBurned(receipt));
        }
        self.claims.mark_closed(resolution.claim, burned)?;
        Ok(resolution.outcome)
    }

    // ── Administration ───────────────────────────────────────────────────

    pub fn admit_member(&mut self, caller: &Caller, member: &MemberId) -> Result<(), PoolError> {
        self.authorize(caller, caller.is_governance(), "admit members")?;
        if self.members.is_member(member) {
            return Err(PoolError::AlreadyMember(member.clone()));
        }
        self.members.admit(member.clone());
        self.accounts.entry(member.clone()).or_default();
        tracing::info!(member = %member, "member admitted");
        self.pending_events.push(PoolEvent::MemberAdmitted {
            member: member.clone(),
        });
        Ok(())
    }

    /// Remove a member. Its account stays so released tokens can still be
    /// withdrawn.
    pub fn expel_member(&mut self, caller: &Caller, member: &MemberId) -> Result<(), PoolError> {
        self.authorize(caller, caller.is_governance(), "expel members")?;
        if !self.members.expel(member) {
            return Err(PoolError::NotAMember(member.clone()));
        }
        tracing::info!(member = %member, "member expelled");
        self.pending_events.push(PoolEvent::MemberExpelled {
            member: member.clone(),
        });
        Ok(())
    }

    /// Credit freshly issued tokens to a member (genesis and tests).
    pub fn mint(&mut self, caller: &Caller, member: &MemberId, amount: u128) -> Result<(), PoolError> {
        self.authorize(caller, caller.is_governance(), "mint tokens")?;
        if amount == 0 {
            return Err(PoolError::InvalidAmount);
        }
        self.ensure_member(member)?;
        Self::account_mut(&mut self.accounts, member)?.credit(amount)?;
        tracing::info!(member = %member, amount, "tokens minted");
        self.pending_events.push(PoolEvent::Minted {
            member: member.clone(),
            amount,
        });
        Ok(())
    }

    pub fn pause(&mut self, caller: &Caller) -> Result<(), PoolError> {
        self.authorize(caller, caller.is_governance(), "pause the pool")?;
        if !self.paused {
            self.paused = true;
            tracing::warn!("pool paused");
            self.pending_events.push(PoolEvent::Paused);
        }
        Ok(())
    }

    pub fn resume(&mut self, caller: &Caller) -> Result<(), PoolError> {
        self.authorize(caller, caller.is_governance(), "resume the pool")?;
        if self.paused {
            self.paused = false;
            tracing::info!("pool resumed");
            self.pending_events.push(PoolEvent::Resumed);
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Time of the last successful mutation.
    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_member(&self, id: &MemberId) -> bool {
        self.members.is_member(id)
    }

    pub fn members(&self) -> &MemberRoll {
        &self.members
    }

    /// Spendable balance; zero for unknown ids.
    pub fn balance(&self, id: &MemberId) -> u128 {
        self.accounts.get(id).map(|a| a.spendable).unwrap_or(0)
    }

    pub fn accounts(&self) -> &BTreeMap<MemberId, TokenAccount> {
        &self.accounts
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn staking(&self) -> &StakingLedger {
        &self.staking
    }

    pub fn claims(&self) -> &ClaimsEngine {
        &self.claims
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
