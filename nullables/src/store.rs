//! Nullable store: thread-safe in-memory storage for testing.

use mutual_store::{PoolStore, StoreError, StoreOp, Table, WriteBatch};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Tables = BTreeMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>;

/// An in-memory [`PoolStore`].
///
/// Batches are applied to a copy of the tables and swapped in, so a failing
/// batch leaves the store untouched.
#[derive(Debug, Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    fail_next_apply: Mutex<bool>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `apply` fail without writing anything.
    pub fn fail_next_apply(&self) {
        if let Ok(mut flag) = self.fail_next_apply.lock() {
            *flag = true;
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("null store lock poisoned".into()))
    }
}

impl PoolStore for NullStore {
    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if let Ok(mut flag) = self.fail_next_apply.lock() {
            if std::mem::take(&mut *flag) {
                return Err(StoreError::Backend("injected apply failure".into()));
            }
        }
        let mut tables = self.tables()?;
        let mut staged = tables.clone();
        for op in batch.into_ops() {
            match op {
                StoreOp::Put { table, key, value } => {
                    staged.entry(table).or_default().insert(key, value);
                }
                StoreOp::Delete { table, key } => {
                    if let Some(t) = staged.get_mut(&table) {
                        t.remove(&key);
                    }
                }
                StoreOp::Clear(table) => {
                    staged.remove(&table);
                }
            }
        }
        *tables = staged;
        Ok(())
    }

    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .tables()?
            .get(&table)
            .and_then(|t| t.get(key))
            .cloned())
    }

    fn iter(&self, table: Table) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self
            .tables()?
            .get(&table)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_failure_writes_nothing() {
        let store = NullStore::new();
        store.fail_next_apply();
        let mut batch = WriteBatch::new();
        batch.put(Table::Accounts, b"a".to_vec(), b"1".to_vec());
        assert!(store.apply(batch.clone()).is_err());
        assert_eq!(store.count(Table::Accounts).unwrap(), 0);
        store.apply(batch).unwrap();
        assert_eq!(store.get(Table::Accounts, b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn iter_is_key_ordered() {
        let store = NullStore::new();
        let mut batch = WriteBatch::new();
        batch.put(Table::Deposits, 3u64.to_be_bytes(), b"c".to_vec());
        batch.put(Table::Deposits, 1u64.to_be_bytes(), b"a".to_vec());
        store.apply(batch).unwrap();
        let values: Vec<Vec<u8>> = store
            .iter(Table::Deposits)
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![b"a".to_vec(), b"c".to_vec()]);
    }
}
