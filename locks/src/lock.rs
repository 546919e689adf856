//! A single token lock.

use mutual_types::{LockReason, MemberId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLock {
    pub holder: MemberId,
    pub reason: LockReason,
    /// Tokens held by the lock. Zero once released.
    pub amount: u128,
    /// First instant at which the lock no longer holds its tokens.
    pub valid_until: Timestamp,
}

impl TokenLock {
    /// Whether the lock still holds tokens at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.amount > 0 && now < self.valid_until
    }

    /// Whether the lock has lapsed but its tokens were not credited back yet.
    pub fn is_releasable(&self, now: Timestamp) -> bool {
        self.amount > 0 && now >= self.valid_until
    }

    /// The locked amount as seen at `at`.
    pub fn amount_at(&self, at: Timestamp) -> u128 {
        if at < self.valid_until {
            self.amount
        } else {
            0
        }
    }
}
