//! LMDB storage backend for the mutual pool.
//!
//! Implements [`mutual_store::PoolStore`] using the `heed` LMDB bindings.
//! Each [`mutual_store::Table`] maps to one named LMDB database within a
//! single environment.

pub mod environment;
pub mod error;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use migration::Migrator;
