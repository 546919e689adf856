//! Errors raised by the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid unlock curve: {0}")]
    InvalidCurve(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}
