use mutual_types::{MemberId, Timestamp};
use thiserror::Error;

use crate::caller::Caller;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("lock error: {0}")]
    Lock(#[from] mutual_locks::LockError),

    #[error("staking error: {0}")]
    Staking(#[from] mutual_staking::StakingError),

    #[error("claim error: {0}")]
    Claim(#[from] mutual_claims::ClaimError),

    #[error("store error: {0}")]
    Store(#[from] mutual_store::StoreError),

    #[error("{0}")]
    Types(#[from] mutual_types::TypesError),

    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("pool is paused")]
    Paused,

    #[error("clock at {now} precedes last pool activity at {last}")]
    TimeWentBackwards { last: Timestamp, now: Timestamp },

    #[error("{caller} may not {action}")]
    Unauthorized { caller: Caller, action: &'static str },

    #[error("{0} is not a member")]
    NotAMember(MemberId),

    #[error("{0} is already a member")]
    AlreadyMember(MemberId),

    #[error("invalid contract address: {0}")]
    InvalidContract(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for PoolError {
    fn from(e: bincode::Error) -> Self {
        PoolError::Serialization(e.to_string())
    }
}
