//! Abstract storage traits for the mutual pool.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`PoolStore`]. Values are opaque bytes; the engines serialize their own
//! records. The rest of the codebase depends only on the trait.

pub mod batch;
pub mod error;
pub mod meta;
pub mod table;

pub use batch::{StoreOp, WriteBatch};
pub use error::StoreError;
pub use meta::{MetaKey, CURRENT_SCHEMA_VERSION};
pub use table::Table;

/// A key-value store with one keyspace per [`Table`].
pub trait PoolStore {
    /// Apply every operation in `batch` atomically: either all of them
    /// become visible or none does.
    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every entry of `table`, in ascending key order.
    fn iter(&self, table: Table) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn count(&self, table: Table) -> Result<u64, StoreError> {
        self.iter(table).map(|entries| entries.len() as u64)
    }

    fn get_meta(&self, key: MetaKey) -> Result<Option<Vec<u8>>, StoreError> {
        self.get(Table::Meta, key.as_bytes())
    }

    /// Stored schema version; zero for a fresh store.
    fn schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta(MetaKey::SchemaVersion)? {
            None => Ok(0),
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
        }
    }
}
