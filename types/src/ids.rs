//! Sequential record identifiers handed out by the pool.
//!
//! Callers only ever hold ids, never references into the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(&self) -> u64 {
                self.0
            }

            /// Big-endian key bytes; preserve numeric order in byte-ordered stores.
            pub fn to_key(&self) -> [u8; 8] {
                self.0.to_be_bytes()
            }

            pub fn from_key(bytes: &[u8]) -> Option<Self> {
                let arr: [u8; 8] = bytes.try_into().ok()?;
                Some(Self(u64::from_be_bytes(arr)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

sequential_id!(
    /// Global creation sequence of a stake deposit. Later deposits have larger ids.
    DepositId,
    "deposit"
);
sequential_id!(
    /// Identifier of a registered cover.
    CoverId,
    "cover"
);
sequential_id!(
    /// Identifier of a submitted claim.
    ClaimId,
    "claim"
);
