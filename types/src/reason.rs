//! Reasons a member can lock tokens for.

use serde::{Deserialize, Serialize};
use std::fmt;

/// At most one active lock exists per (holder, reason).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LockReason {
    /// Tokens committed to vote as a claims assessor ("CLA").
    ClaimsAssessment,
    /// Deposit held against a purchased cover ("CN").
    CoverNote,
    /// Tokens locked for governance participation ("GOV").
    Governance,
}

impl LockReason {
    pub const ALL: [LockReason; 3] = [
        LockReason::ClaimsAssessment,
        LockReason::CoverNote,
        LockReason::Governance,
    ];

    /// Short legacy code for this reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ClaimsAssessment => "CLA",
            Self::CoverNote => "CN",
            Self::Governance => "GOV",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for reason in LockReason::ALL {
            assert_eq!(LockReason::from_code(reason.code()), Some(reason));
        }
        assert_eq!(LockReason::from_code("XYZ"), None);
    }
}
