//! Pool parameters: the unlock curve calibration, burn policy and claims
//! voting rules.
//!
//! Every field has a serde default so a partial TOML table is enough.

use crate::error::TypesError;
use crate::time::DAY_SECS;
use serde::{Deserialize, Serialize};

/// Basis-point denominator (100% = 10_000 bps).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Legacy bonding period: staked principal fully unlocks after 250 days.
pub const DEFAULT_BONDING_PERIOD_SECS: u64 = 250 * DAY_SECS;

/// One breakpoint of the unlock curve: at `age_secs` after staking,
/// `vested_bps` of the principal is eligible for unlock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub age_secs: u64,
    pub vested_bps: u32,
}

/// Calibration data for the unlock curve. Interpolated linearly between
/// breakpoints; flat at 100% after the last one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockCurveParams {
    pub points: Vec<CurvePoint>,
}

impl UnlockCurveParams {
    /// A straight line from 0% at staking time to 100% after `bonding_period_secs`.
    pub fn linear(bonding_period_secs: u64) -> Self {
        Self {
            points: vec![
                CurvePoint {
                    age_secs: 0,
                    vested_bps: 0,
                },
                CurvePoint {
                    age_secs: bonding_period_secs,
                    vested_bps: BPS_DENOMINATOR,
                },
            ],
        }
    }

    /// Age at which the whole principal has vested.
    pub fn bonding_period_secs(&self) -> u64 {
        self.points.last().map(|p| p.age_secs).unwrap_or(0)
    }

    /// Check the curve is usable: starts at (0, 0), ages strictly increase,
    /// vesting never decreases and ends at 100%.
    pub fn validate(&self) -> Result<(), TypesError> {
        let first = self
            .points
            .first()
            .ok_or_else(|| TypesError::InvalidCurve("no breakpoints".into()))?;
        if first.age_secs != 0 || first.vested_bps != 0 {
            return Err(TypesError::InvalidCurve(
                "first breakpoint must be (0s, 0bps)".into(),
            ));
        }
        if self.points.len() < 2 {
            return Err(TypesError::InvalidCurve(
                "at least two breakpoints are required".into(),
            ));
        }
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b.age_secs <= a.age_secs {
                return Err(TypesError::InvalidCurve(format!(
                    "ages must strictly increase ({}s then {}s)",
                    a.age_secs, b.age_secs
                )));
            }
            if b.vested_bps < a.vested_bps {
                return Err(TypesError::InvalidCurve(format!(
                    "vesting must not decrease ({}bps then {}bps)",
                    a.vested_bps, b.vested_bps
                )));
            }
        }
        let last = self.points[self.points.len() - 1];
        if last.vested_bps != BPS_DENOMINATOR {
            return Err(TypesError::InvalidCurve(format!(
                "last breakpoint must vest {BPS_DENOMINATOR}bps, got {}",
                last.vested_bps
            )));
        }
        Ok(())
    }
}

impl Default for UnlockCurveParams {
    fn default() -> Self {
        Self::linear(DEFAULT_BONDING_PERIOD_SECS)
    }
}

/// Which part of a deposit a burn may consume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnScope {
    /// Only principal the unlock curve has not vested yet.
    #[default]
    LockedPrincipal,
    /// Any principal not yet burned or withdrawn.
    FullPrincipal,
}

/// All tunable pool parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolParams {
    // ── Staking ──────────────────────────────────────────────────────────
    /// Unlock curve breakpoints.
    pub unlock_curve: UnlockCurveParams,

    /// Burn policy. Fixed for the lifetime of a pool.
    pub burn_scope: BurnScope,

    // ── Claims assessment ────────────────────────────────────────────────
    /// Minimum CLA lock (raw units) an assessor needs to vote.
    #[serde(with = "crate::amount")]
    pub ca_min_lock: u128,

    /// How long claims assessors may vote after submission.
    pub ca_voting_secs: u64,

    /// Share of CA vote weight (bps) needed to accept or deny outright.
    pub ca_threshold_bps: u32,

    /// Minimum total CA vote weight; below it the claim escalates.
    #[serde(with = "crate::amount")]
    pub ca_quorum: u128,

    /// How long members may vote on an escalated claim.
    pub member_voting_secs: u64,

    /// Share of member votes (bps) needed to accept an escalated claim.
    pub member_threshold_bps: u32,

    // ── Covers ───────────────────────────────────────────────────────────
    /// Claims may still be submitted this long after a cover expires.
    pub claim_grace_secs: u64,

    /// Maximum number of claims per cover.
    pub max_claims_per_cover: u32,
}

impl PoolParams {
    pub fn validate(&self) -> Result<(), TypesError> {
        self.unlock_curve.validate()?;
        for (name, bps) in [
            ("ca_threshold_bps", self.ca_threshold_bps),
            ("member_threshold_bps", self.member_threshold_bps),
        ] {
            if bps == 0 || bps > BPS_DENOMINATOR {
                return Err(TypesError::InvalidParam(format!(
                    "{name} must be within 1..={BPS_DENOMINATOR}, got {bps}"
                )));
            }
        }
        if self.ca_voting_secs == 0 || self.member_voting_secs == 0 {
            return Err(TypesError::InvalidParam(
                "voting windows must be non-zero".into(),
            ));
        }
        if self.max_claims_per_cover == 0 {
            return Err(TypesError::InvalidParam(
                "max_claims_per_cover must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            unlock_curve: UnlockCurveParams::default(),
            burn_scope: BurnScope::LockedPrincipal,
            ca_min_lock: 100,
            ca_voting_secs: 3 * DAY_SECS,
            ca_threshold_bps: 7000, // 70%
            ca_quorum: 1,
            member_voting_secs: 7 * DAY_SECS,
            member_threshold_bps: 5001, // simple majority
            claim_grace_secs: 30 * DAY_SECS,
            max_claims_per_cover: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PoolParams::default().validate().unwrap();
        assert_eq!(
            PoolParams::default().unlock_curve.bonding_period_secs(),
            250 * DAY_SECS
        );
    }

    #[test]
    fn curve_must_start_at_origin() {
        let curve = UnlockCurveParams {
            points: vec![
                CurvePoint { age_secs: 10, vested_bps: 0 },
                CurvePoint { age_secs: 20, vested_bps: 10_000 },
            ],
        };
        assert!(matches!(curve.validate(), Err(TypesError::InvalidCurve(_))));
    }

    #[test]
    fn curve_must_not_decrease() {
        let curve = UnlockCurveParams {
            points: vec![
                CurvePoint { age_secs: 0, vested_bps: 0 },
                CurvePoint { age_secs: 10, vested_bps: 6000 },
                CurvePoint { age_secs: 20, vested_bps: 5000 },
                CurvePoint { age_secs: 30, vested_bps: 10_000 },
            ],
        };
        assert!(curve.validate().is_err());
    }

    #[test]
    fn curve_must_end_fully_vested() {
        let curve = UnlockCurveParams {
            points: vec![
                CurvePoint { age_secs: 0, vested_bps: 0 },
                CurvePoint { age_secs: 10, vested_bps: 9000 },
            ],
        };
        assert!(curve.validate().is_err());
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let params = PoolParams {
            ca_threshold_bps: 10_001,
            ..PoolParams::default()
        };
        assert!(matches!(params.validate(), Err(TypesError::InvalidParam(_))));
    }
}
