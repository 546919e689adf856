//! Keyspaces of the pool database.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Table {
    /// `MemberId` → token account.
    Accounts,
    /// Admitted members.
    Members,
    /// (holder, reason) → token lock.
    Locks,
    /// Big-endian `DepositId` → stake deposit. Append-only.
    Deposits,
    /// Contract address → burn cursor.
    Cursors,
    /// Big-endian `CoverId` → cover.
    Covers,
    /// Big-endian `ClaimId` → claim.
    Claims,
    /// Bookkeeping: schema version, clock high-water mark, pause flag.
    Meta,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Accounts,
        Table::Members,
        Table::Locks,
        Table::Deposits,
        Table::Cursors,
        Table::Covers,
        Table::Claims,
        Table::Meta,
    ];

    /// Database name used by on-disk backends.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Accounts => "accounts",
            Table::Members => "members",
            Table::Locks => "locks",
            Table::Deposits => "deposits",
            Table::Cursors => "cursors",
            Table::Covers => "covers",
            Table::Claims => "claims",
            Table::Meta => "meta",
        }
    }

    /// Position in [`Table::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, table) in Table::ALL.iter().enumerate() {
            assert_eq!(table.index(), i);
        }
    }
}
