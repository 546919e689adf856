//! Spendable token balance of a member.
//!
//! Amounts are raw NXM units (u128) to avoid floating-point errors. Locked
//! and staked tokens are not part of `spendable`; they live in the lock
//! registry and the staking ledger until released.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    pub spendable: u128,
}

impl TokenAccount {
    pub fn new(spendable: u128) -> Self {
        Self { spendable }
    }

    /// Check that `amount` could be debited without touching the balance.
    pub fn ensure_can_debit(&self, amount: u128) -> Result<(), TypesError> {
        if self.spendable < amount {
            return Err(TypesError::InsufficientBalance {
                needed: amount,
                available: self.spendable,
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, amount: u128) -> Result<(), TypesError> {
        self.ensure_can_debit(amount)?;
        self.spendable -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: u128) -> Result<(), TypesError> {
        self.spendable = self
            .spendable
            .checked_add(amount)
            .ok_or(TypesError::Overflow)?;
        Ok(())
    }
}

impl fmt::Display for TokenAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} NXM", self.spendable)
    }
}
