//! Mutual risk pool service.
//!
//! The [`Pool`] is the single owner of all pool state:
//! - member accounts and the membership roll
//! - the lock registry (claims assessment, cover note, governance locks)
//! - the staking ledger with its unlock curve and FIFO burn engine
//! - the cover book and claims state machine
//!
//! Every mutation takes `&mut self`, validates before it mutates, and is
//! gated by the pause switch. Callers hold ids, never references into the
//! ledgers.

pub mod caller;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod membership;
pub mod persist;
pub mod pool;

pub use caller::Caller;
pub use config::PoolConfig;
pub use error::PoolError;
pub use event::PoolEvent;
pub use logging::{init_logging, LogFormat};
pub use membership::{MemberRoll, Membership};
pub use pool::Pool;
