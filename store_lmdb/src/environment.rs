//! LMDB environment setup and the [`PoolStore`] implementation.

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use mutual_store::{PoolStore, StoreError, StoreOp, Table, WriteBatch};

use crate::LmdbError;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and one database handle per table.
pub struct LmdbEnvironment {
    env: Env,
    dbs: Vec<Database<Bytes, Bytes>>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment in the directory `path`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per directory by this
        // process and never memory-mapped by other code.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(Table::ALL.len() as u32)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let mut dbs = Vec::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(table.name()))?;
            dbs.push(db);
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "LMDB environment opened");
        Ok(Self {
            env,
            dbs,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn db(&self, table: Table) -> Database<Bytes, Bytes> {
        self.dbs[table.index()]
    }
}

impl PoolStore for LmdbEnvironment {
    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let ops = batch.len();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in batch.into_ops() {
            match op {
                StoreOp::Put { table, key, value } => {
                    self.db(table)
                        .put(&mut wtxn, &key, &value)
                        .map_err(LmdbError::from)?;
                }
                StoreOp::Delete { table, key } => {
                    self.db(table)
                        .delete(&mut wtxn, &key)
                        .map_err(LmdbError::from)?;
                }
                StoreOp::Clear(table) => {
                    self.db(table).clear(&mut wtxn).map_err(LmdbError::from)?;
                }
            }
        }
        // Dropping the transaction on an error above aborts it.
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(ops, "write batch committed");
        Ok(())
    }

    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self
            .db(table)
            .get(&rtxn, key)
            .map_err(LmdbError::from)?
            .map(|v| v.to_vec());
        Ok(value)
    }

    fn iter(&self, table: Table) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for item in self.db(table).iter(&rtxn).map_err(LmdbError::from)? {
            let (k, v) = item.map_err(LmdbError::from)?;
            entries.push((k.to_vec(), v.to_vec()));
        }
        Ok(entries)
    }

    fn count(&self, table: Table) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.db(table).len(&rtxn).map_err(LmdbError::from)?)
    }
}
