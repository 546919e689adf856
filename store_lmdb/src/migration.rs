//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta table and
//! runs sequential migration steps to bring an older database up to date.

use mutual_store::{MetaKey, PoolStore, StoreError, WriteBatch, CURRENT_SCHEMA_VERSION};

use crate::LmdbError;

pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// Version 0 is a fresh database. A version newer than
    /// [`CURRENT_SCHEMA_VERSION`] was written by newer code and is refused.
    pub fn run(store: &impl PoolStore) -> Result<(), StoreError> {
        let current = store.schema_version()?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::info!(version = current, "database schema is up to date");
            return Ok(());
        }
        if current > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        let mut batch = WriteBatch::new();
        batch.put_meta(MetaKey::SchemaVersion, &CURRENT_SCHEMA_VERSION.to_le_bytes());
        store.apply(batch)?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Blank slate: tables are created when the environment opens.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::UnknownMigration { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    #[test]
    fn unknown_migration_is_error() {
        assert!(run_migration(99, 100).is_err());
    }

    #[test]
    fn fresh_database_is_stamped_with_current_version() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 << 20).unwrap();
        assert_eq!(env.schema_version().unwrap(), 0);
        Migrator::run(&env).unwrap();
        assert_eq!(env.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        Migrator::run(&env).unwrap();
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 << 20).unwrap();
        let mut batch = WriteBatch::new();
        batch.put_meta(MetaKey::SchemaVersion, &(CURRENT_SCHEMA_VERSION + 1).to_le_bytes());
        env.apply(batch).unwrap();
        assert!(matches!(
            Migrator::run(&env),
            Err(StoreError::UnsupportedSchema { .. })
        ));
    }
}
