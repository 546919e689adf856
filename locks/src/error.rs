//! Lock registry errors.

use mutual_types::{LockReason, MemberId, TypesError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("{holder} already holds an active {reason} lock")]
    AlreadyLocked { holder: MemberId, reason: LockReason },

    #[error("{holder} has no active {reason} lock")]
    NoActiveLock { holder: MemberId, reason: LockReason },

    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("arithmetic overflow in lock computation")]
    Overflow,
}

impl From<TypesError> for LockError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InsufficientBalance { needed, available } => {
                LockError::InsufficientBalance { needed, available }
            }
            _ => LockError::Overflow,
        }
    }
}
