//! Staking-specific errors.

use mutual_types::{ContractAddress, Timestamp, TypesError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StakingError {
    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient stake on {contract}: requested {requested}, burnable {available}")]
    InsufficientStake {
        contract: ContractAddress,
        requested: u128,
        available: u128,
    },

    #[error("deposit {0} not found")]
    DepositNotFound(u64),

    #[error("invalid unlock curve: {0}")]
    InvalidCurve(String),

    #[error("timestamp {now} precedes last ledger activity at {last}")]
    TimeWentBackwards { last: Timestamp, now: Timestamp },

    #[error("arithmetic overflow in staking computation")]
    Overflow,

    #[error("corrupt ledger: {0}")]
    Corrupt(String),
}

impl From<TypesError> for StakingError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InsufficientBalance { needed, available } => {
                StakingError::InsufficientBalance { needed, available }
            }
            TypesError::InvalidCurve(msg) | TypesError::InvalidParam(msg) => {
                StakingError::InvalidCurve(msg)
            }
            TypesError::Overflow => StakingError::Overflow,
        }
    }
}
