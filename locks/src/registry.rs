//! The lock table and its operations.

use crate::error::LockError;
use crate::lock::TokenLock;
use mutual_types::{LockReason, MemberId, Timestamp, TokenAccount};
use std::collections::BTreeMap;

/// Owns every lock in the pool.
///
/// Operations take the holder's `TokenAccount` explicitly; every check runs
/// before the account or the table is touched, so a failed call has no effect.
#[derive(Clone, Debug, Default)]
pub struct LockRegistry {
    locks: BTreeMap<(MemberId, LockReason), TokenLock>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted locks.
    pub fn from_locks(locks: impl IntoIterator<Item = TokenLock>) -> Self {
        Self {
            locks: locks
                .into_iter()
                .map(|l| ((l.holder.clone(), l.reason), l))
                .collect(),
        }
    }

    /// Lock `amount` tokens for `reason` until `now + validity_secs`.
    ///
    /// A lapsed lock for the same reason is credited back before the new one
    /// is created.
    pub fn lock(
        &mut self,
        holder: &MemberId,
        account: &mut TokenAccount,
        reason: LockReason,
        amount: u128,
        validity_secs: u64,
        now: Timestamp,
    ) -> Result<&TokenLock, LockError> {
        if amount == 0 {
            return Err(LockError::InvalidAmount);
        }
        let key = (holder.clone(), reason);
        let lapsed = match self.locks.get(&key) {
            Some(existing) if existing.is_active(now) => {
                return Err(LockError::AlreadyLocked {
                    holder: holder.clone(),
                    reason,
                });
            }
            Some(existing) => existing.amount,
            None => 0,
        };
        let available = account
            .spendable
            .checked_add(lapsed)
            .ok_or(LockError::Overflow)?;
        if available < amount {
            return Err(LockError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        account.credit(lapsed)?;
        account.debit(amount)?;
        let valid_until = now.plus(validity_secs);
        tracing::info!(
            holder = %holder,
            reason = %reason,
            amount,
            valid_until = valid_until.as_secs(),
            "tokens locked"
        );
        let lock = TokenLock {
            holder: holder.clone(),
            reason,
            amount,
            valid_until,
        };
        self.locks.insert(key.clone(), lock);
        Ok(&self.locks[&key])
    }

    /// Push back the expiry of a live lock.
    pub fn extend_lock(
        &mut self,
        holder: &MemberId,
        reason: LockReason,
        extra_secs: u64,
        now: Timestamp,
    ) -> Result<&TokenLock, LockError> {
        if extra_secs == 0 {
            return Err(LockError::InvalidAmount);
        }
        let lock = self.active_mut(holder, reason, now)?;
        lock.valid_until = lock.valid_until.plus(extra_secs);
        tracing::info!(
            holder = %holder,
            reason = %reason,
            valid_until = lock.valid_until.as_secs(),
            "lock extended"
        );
        Ok(lock)
    }

    /// Move more spendable tokens into a live lock.
    pub fn increase_lock_amount(
        &mut self,
        holder: &MemberId,
        account: &mut TokenAccount,
        reason: LockReason,
        extra_amount: u128,
        now: Timestamp,
    ) -> Result<&TokenLock, LockError> {
        if extra_amount == 0 {
            return Err(LockError::InvalidAmount);
        }
        let lock = self.active_mut(holder, reason, now)?;
        let new_amount = lock
            .amount
            .checked_add(extra_amount)
            .ok_or(LockError::Overflow)?;
        account.debit(extra_amount)?;
        lock.amount = new_amount;
        tracing::info!(holder = %holder, reason = %reason, amount = new_amount, "lock increased");
        Ok(lock)
    }

    /// Shorten a lock so it lapses no later than `now + new_duration_secs`.
    ///
    /// Never lengthens a lock.
    pub fn reduce_lock(
        &mut self,
        holder: &MemberId,
        reason: LockReason,
        new_duration_secs: u64,
        now: Timestamp,
    ) -> Result<&TokenLock, LockError> {
        let lock = match self.locks.get_mut(&(holder.clone(), reason)) {
            Some(lock) if lock.amount > 0 => lock,
            _ => {
                return Err(LockError::NoActiveLock {
                    holder: holder.clone(),
                    reason,
                })
            }
        };
        let target = now.plus(new_duration_secs);
        if target < lock.valid_until {
            lock.valid_until = target;
        }
        tracing::info!(
            holder = %holder,
            reason = %reason,
            valid_until = lock.valid_until.as_secs(),
            "lock reduced"
        );
        Ok(lock)
    }

    /// Credit every lapsed lock of `holder` back to `account`.
    ///
    /// Returns the total released; zero when nothing has lapsed.
    pub fn unlock(
        &mut self,
        holder: &MemberId,
        account: &mut TokenAccount,
        now: Timestamp,
    ) -> Result<u128, LockError> {
        let releasable = self.unlockable_total(holder, now)?;
        if releasable == 0 {
            tracing::debug!(holder = %holder, "nothing to unlock");
            return Ok(0);
        }
        account.credit(releasable)?;
        for lock in self.locks_of_mut(holder) {
            if lock.is_releasable(now) {
                lock.amount = 0;
            }
        }
        // Released locks are no longer needed as records.
        self.locks
            .retain(|(h, _), lock| h != holder || lock.amount > 0);
        tracing::info!(holder = %holder, amount = releasable, "expired locks released");
        Ok(releasable)
    }

    /// The amount locked for (holder, reason) as seen at `at`.
    pub fn locked_amount(&self, holder: &MemberId, reason: LockReason, at: Timestamp) -> u128 {
        self.locks
            .get(&(holder.clone(), reason))
            .map(|l| l.amount_at(at))
            .unwrap_or(0)
    }

    /// Total locked across every reason at `at`.
    pub fn tokens_locked_total(&self, holder: &MemberId, at: Timestamp) -> u128 {
        self.locks_of(holder)
            .map(|l| l.amount_at(at))
            .fold(0u128, |acc, a| acc.saturating_add(a))
    }

    /// Total that `unlock` would release at `now`.
    pub fn unlockable_total(&self, holder: &MemberId, now: Timestamp) -> Result<u128, LockError> {
        self.locks_of(holder)
            .filter(|l| l.is_releasable(now))
            .try_fold(0u128, |acc, l| acc.checked_add(l.amount))
            .ok_or(LockError::Overflow)
    }

    pub fn lock_of(&self, holder: &MemberId, reason: LockReason) -> Option<&TokenLock> {
        self.locks.get(&(holder.clone(), reason))
    }

    pub fn locks_of<'a>(&'a self, holder: &'a MemberId) -> impl Iterator<Item = &'a TokenLock> {
        self.locks.values().filter(move |l| &l.holder == holder)
    }

    /// Every lock in the table, ordered by (holder, reason).
    pub fn iter(&self) -> impl Iterator<Item = &TokenLock> {
        self.locks.values()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn locks_of_mut<'a>(
        &'a mut self,
        holder: &'a MemberId,
    ) -> impl Iterator<Item = &'a mut TokenLock> {
        self.locks.values_mut().filter(move |l| &l.holder == holder)
    }

    fn active_mut(
        &mut self,
        holder: &MemberId,
        reason: LockReason,
        now: Timestamp,
    ) -> Result<&mut TokenLock, LockError> {
        match self.locks.get_mut(&(holder.clone(), reason)) {
            Some(lock) if lock.is_active(now) => Ok(lock),
            _ => Err(LockError::NoActiveLock {
                holder: holder.clone(),
                reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutual_types::DAY_SECS;

    const CLA: LockReason = LockReason::ClaimsAssessment;

    fn member(n: u8) -> MemberId {
        MemberId::new(format!("member-{n}"))
    }

    fn t(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn lock_debits_balance_and_sets_expiry() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        let lock = reg.lock(&member(1), &mut acct, CLA, 400, 30 * DAY_SECS, t(100)).unwrap();
        assert_eq!(lock.amount, 400);
        assert_eq!(lock.valid_until, t(100 + 30 * DAY_SECS));
        assert_eq!(acct.spendable, 600);
    }

    #[test]
    fn lock_more_than_balance_fails_without_side_effects() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(100);
        let err = reg.lock(&member(1), &mut acct, CLA, 101, 10, t(0)).unwrap_err();
        assert_eq!(
            err,
            LockError::InsufficientBalance {
                needed: 101,
                available: 100
            }
        );
        assert_eq!(acct.spendable, 100);
        assert!(reg.is_empty());
    }

    #[test]
    fn second_active_lock_for_same_reason_is_rejected() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 100, 10, t(0)).unwrap();
        let err = reg.lock(&member(1), &mut acct, CLA, 100, 10, t(5)).unwrap_err();
        assert!(matches!(err, LockError::AlreadyLocked { .. }));
        assert_eq!(acct.spendable, 900);

        // A different reason is independent.
        reg.lock(&member(1), &mut acct, LockReason::CoverNote, 100, 10, t(5)).unwrap();
        assert_eq!(acct.spendable, 800);
    }

    #[test]
    fn relock_after_expiry_recycles_lapsed_tokens() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(100);
        reg.lock(&member(1), &mut acct, CLA, 100, 10, t(0)).unwrap();
        assert_eq!(acct.spendable, 0);
        // Lapsed 100 is credited back and 80 of it relocked.
        reg.lock(&member(1), &mut acct, CLA, 80, 10, t(10)).unwrap();
        assert_eq!(acct.spendable, 20);
        assert_eq!(reg.locked_amount(&member(1), CLA, t(15)), 80);
    }

    #[test]
    fn zero_amount_is_invalid() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(100);
        assert_eq!(
            reg.lock(&member(1), &mut acct, CLA, 0, 10, t(0)).unwrap_err(),
            LockError::InvalidAmount
        );
    }

    #[test]
    fn extend_live_lock_increases_expiry_only() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 300, 100, t(0)).unwrap();
        let lock = reg.extend_lock(&member(1), CLA, 50, t(10)).unwrap();
        assert_eq!(lock.valid_until, t(150));
        assert_eq!(lock.amount, 300);
    }

    #[test]
    fn extend_by_zero_is_invalid() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 300, 100, t(0)).unwrap();
        assert_eq!(
            reg.extend_lock(&member(1), CLA, 0, t(10)).unwrap_err(),
            LockError::InvalidAmount
        );
        assert_eq!(reg.lock_of(&member(1), CLA).unwrap().valid_until, t(100));
    }

    #[test]
    fn extend_expired_lock_fails() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 300, 100, t(0)).unwrap();
        let err = reg.extend_lock(&member(1), CLA, 50, t(100)).unwrap_err();
        assert!(matches!(err, LockError::NoActiveLock { .. }));
        assert_eq!(reg.lock_of(&member(1), CLA).unwrap().valid_until, t(100));
    }

    #[test]
    fn increase_amount_debits_balance() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 300, 100, t(0)).unwrap();
        reg.increase_lock_amount(&member(1), &mut acct, CLA, 200, t(50)).unwrap();
        assert_eq!(reg.locked_amount(&member(1), CLA, t(50)), 500);
        assert_eq!(acct.spendable, 500);

        let err = reg
            .increase_lock_amount(&member(1), &mut acct, CLA, 501, t(50))
            .unwrap_err();
        assert!(matches!(err, LockError::InsufficientBalance { .. }));
        assert_eq!(reg.locked_amount(&member(1), CLA, t(50)), 500);

        let err = reg
            .increase_lock_amount(&member(1), &mut acct, CLA, 1, t(100))
            .unwrap_err();
        assert!(matches!(err, LockError::NoActiveLock { .. }));
    }

    #[test]
    fn reduce_only_shortens() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 300, 100, t(0)).unwrap();
        assert_eq!(reg.reduce_lock(&member(1), CLA, 500, t(10)).unwrap().valid_until, t(100));
        assert_eq!(reg.reduce_lock(&member(1), CLA, 20, t(10)).unwrap().valid_until, t(30));
        assert!(matches!(
            reg.reduce_lock(&member(2), CLA, 20, t(10)),
            Err(LockError::NoActiveLock { .. })
        ));
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 300, 100, t(0)).unwrap();
        reg.lock(&member(1), &mut acct, LockReason::CoverNote, 200, 500, t(0)).unwrap();

        assert_eq!(reg.unlock(&member(1), &mut acct, t(99)).unwrap(), 0);
        assert_eq!(reg.unlock(&member(1), &mut acct, t(100)).unwrap(), 300);
        assert_eq!(acct.spendable, 800);
        assert_eq!(reg.unlock(&member(1), &mut acct, t(100)).unwrap(), 0);
        assert_eq!(acct.spendable, 800);
        assert!(reg.lock_of(&member(1), CLA).is_none());
        assert_eq!(reg.tokens_locked_total(&member(1), t(100)), 200);
    }

    #[test]
    fn locked_amount_respects_query_time() {
        let mut reg = LockRegistry::new();
        let mut acct = TokenAccount::new(1000);
        reg.lock(&member(1), &mut acct, CLA, 300, 100, t(0)).unwrap();
        assert_eq!(reg.locked_amount(&member(1), CLA, t(99)), 300);
        assert_eq!(reg.locked_amount(&member(1), CLA, t(100)), 0);
        assert_eq!(reg.locked_amount(&member(2), CLA, t(0)), 0);
    }
}
