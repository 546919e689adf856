//! Who is invoking a privileged operation.

use mutual_types::MemberId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caller {
    Member(MemberId),
    /// The claims module, acting on a resolved claim.
    Claims,
    /// The governance module (admin operations, emergency pause).
    Governance,
}

impl Caller {
    pub fn is_claims(&self) -> bool {
        matches!(self, Caller::Claims)
    }

    pub fn is_governance(&self) -> bool {
        matches!(self, Caller::Governance)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Member(id) => write!(f, "member {id}"),
            Caller::Claims => f.write_str("claims"),
            Caller::Governance => f.write_str("governance"),
        }
    }
}
