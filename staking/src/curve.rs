//! Unlock curve engine.
//!
//! The curve maps the age of a deposit to the share of its principal that is
//! eligible for withdrawal. It is piecewise linear between calibration
//! breakpoints and reaches 100% at the bonding period.
//!
//! The share is always applied to the *unburned* principal, so a burn
//! shrinks every future unlock proportionally:
//!
//! `unlockable_to_date = vested_share(age) × (amount − burned)`
//! `net_unlockable     = unlockable_to_date − withdrawn` (floored at zero)

use crate::deposit::StakeDeposit;
use crate::error::StakingError;
use mutual_types::math::mul_div_floor;
use mutual_types::params::{CurvePoint, BPS_DENOMINATOR};
use mutual_types::{BurnScope, Timestamp, UnlockCurveParams};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlockCurve {
    points: Vec<CurvePoint>,
}

impl UnlockCurve {
    /// Build a curve from validated calibration data.
    pub fn new(params: &UnlockCurveParams) -> Result<Self, StakingError> {
        params.validate()?;
        Ok(Self {
            points: params.points.clone(),
        })
    }

    /// Straight-line vesting over `bonding_period_secs`.
    pub fn linear(bonding_period_secs: u64) -> Result<Self, StakingError> {
        Self::new(&UnlockCurveParams::linear(bonding_period_secs))
    }

    pub fn bonding_period_secs(&self) -> u64 {
        self.points.last().map(|p| p.age_secs).unwrap_or(0)
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Portion of `principal` vested at `age_secs`.
    ///
    /// Within a segment `[a_lo, a_hi]` the vested share is interpolated
    /// exactly and floored once, so the result is non-decreasing in age and
    /// in principal, and equals `principal` from the bonding period on.
    pub fn vested(&self, principal: u128, age_secs: u64) -> Result<u128, StakingError> {
        if principal == 0 {
            return Ok(0);
        }
        // Segment whose upper end is the first breakpoint past `age_secs`.
        let upper = self.points.partition_point(|p| p.age_secs <= age_secs);
        if upper >= self.points.len() {
            return Ok(principal);
        }
        let lo = self.points[upper - 1];
        let hi = self.points[upper];

        let span = u128::from(hi.age_secs - lo.age_secs);
        let into = u128::from(age_secs - lo.age_secs);
        let rise = u128::from(hi.vested_bps - lo.vested_bps);
        let numerator = u128::from(lo.vested_bps)
            .checked_mul(span)
            .and_then(|base| rise.checked_mul(into).and_then(|r| base.checked_add(r)))
            .ok_or(StakingError::Overflow)?;
        let denominator = u128::from(BPS_DENOMINATOR)
            .checked_mul(span)
            .ok_or(StakingError::Overflow)?;

        mul_div_floor(principal, numerator, denominator).ok_or(StakingError::Overflow)
    }

    /// Unburned principal eligible for withdrawal at `now`, before
    /// subtracting what was already withdrawn.
    pub fn unlockable_to_date(
        &self,
        deposit: &StakeDeposit,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        let base = deposit.unburned();
        Ok(self.vested(base, deposit.age(now))?.min(base))
    }

    /// What an unlock at `now` would return for this deposit.
    pub fn net_unlockable(
        &self,
        deposit: &StakeDeposit,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        Ok(self
            .unlockable_to_date(deposit, now)?
            .saturating_sub(deposit.withdrawn))
    }

    /// Principal the curve has not vested yet and no burn has taken.
    ///
    /// `amount − vested(amount, age) − burned`, floored at zero.
    pub fn locked_principal(
        &self,
        deposit: &StakeDeposit,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        let vested = self.vested(deposit.amount, deposit.age(now))?;
        Ok(deposit
            .amount
            .saturating_sub(vested)
            .saturating_sub(deposit.burned))
    }

    /// What a burn at `now` may take from this deposit.
    ///
    /// Non-increasing in time for either scope, which keeps per-contract
    /// burn cursors valid.
    pub fn burnable(
        &self,
        deposit: &StakeDeposit,
        now: Timestamp,
        scope: BurnScope,
    ) -> Result<u128, StakingError> {
        match scope {
            BurnScope::LockedPrincipal => self.locked_principal(deposit, now),
            BurnScope::FullPrincipal => Ok(deposit.still_staked()),
        }
    }
}
