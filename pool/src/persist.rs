//! Snapshot persistence of pool state through a [`PoolStore`].
//!
//! A save rewrites every table in one batch, so a snapshot is either fully
//! applied or not at all. Record values are bincode; keys are chosen so the
//! store's byte order matches the in-memory order (ids are big-endian).

use std::collections::BTreeMap;

use mutual_claims::{Claim, ClaimsEngine, Cover};
use mutual_locks::{LockRegistry, TokenLock};
use mutual_nullables::Clock;
use mutual_staking::{StakeDeposit, StakingLedger, UnlockCurve};
use mutual_store::{MetaKey, PoolStore, StoreError, Table, WriteBatch, CURRENT_SCHEMA_VERSION};
use mutual_store_lmdb::{LmdbEnvironment, Migrator};
use mutual_types::{ContractAddress, MemberId, PoolParams, Timestamp, TokenAccount};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::membership::MemberRoll;
use crate::pool::Pool;

/// Open (and migrate) the LMDB store named by `config`.
pub fn open_store(config: &PoolConfig) -> Result<LmdbEnvironment, PoolError> {
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())
        .map_err(StoreError::from)?;
    Migrator::run(&env)?;
    Ok(env)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, PoolError> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(table: Table, bytes: &[u8]) -> Result<T, PoolError> {
    bincode::deserialize(bytes)
        .map_err(|e| StoreError::Corruption(format!("{table}: {e}")).into())
}

fn lock_key(lock: &TokenLock) -> Vec<u8> {
    let mut key = lock.holder.as_str().as_bytes().to_vec();
    key.push(0);
    key.extend_from_slice(lock.reason.code().as_bytes());
    key
}

fn utf8_key(table: Table, key: Vec<u8>) -> Result<String, PoolError> {
    String::from_utf8(key)
        .map_err(|_| StoreError::Corruption(format!("{table}: key is not utf-8")).into())
}

impl<C: Clock> Pool<C> {
    /// Write a full snapshot of the pool to `store`.
    pub fn save_to_store<S: PoolStore + ?Sized>(&self, store: &S) -> Result<(), PoolError> {
        let mut batch = WriteBatch::new();
        for table in Table::ALL {
            batch.clear(table);
        }

        for (id, account) in &self.accounts {
            batch.put(Table::Accounts, id.as_str().as_bytes(), encode(account)?);
        }
        for id in self.members.iter() {
            batch.put(Table::Members, id.as_str().as_bytes(), Vec::new());
        }
        for lock in self.locks.iter() {
            batch.put(Table::Locks, lock_key(lock), encode(lock)?);
        }
        for deposit in self.staking.iter_deposits() {
            batch.put(Table::Deposits, deposit.id.to_key(), encode(deposit)?);
        }
        for (contract, cursor) in self.staking.cursors() {
            batch.put(
                Table::Cursors,
                contract.as_str().as_bytes(),
                (cursor as u64).to_be_bytes(),
            );
        }
        for cover in self.claims.covers().iter() {
            batch.put(Table::Covers, cover.id.to_key(), encode(cover)?);
        }
        for claim in self.claims.claims() {
            batch.put(Table::Claims, claim.id.to_key(), encode(claim)?);
        }

        batch.put_meta(MetaKey::SchemaVersion, &CURRENT_SCHEMA_VERSION.to_le_bytes());
        batch.put_meta(MetaKey::LastActivity, &encode(&self.last_activity)?);
        batch.put_meta(MetaKey::Paused, &[u8::from(self.paused)]);
        batch.put_meta(MetaKey::Params, &encode(&self.params)?);

        let ops = batch.len();
        store.apply(batch)?;
        tracing::info!(
            ops,
            members = self.members.len(),
            deposits = self.staking.deposit_count(),
            locks = self.locks.len(),
            "pool snapshot saved"
        );
        Ok(())
    }

    /// Rebuild a pool from `store`.
    ///
    /// An empty store yields an empty pool with `params`. Otherwise the stored
    /// parameters win, since burn scope and curve must not change under
    /// existing deposits.
    pub fn load_from_store<S: PoolStore + ?Sized>(
        store: &S,
        params: PoolParams,
        clock: C,
    ) -> Result<Self, PoolError> {
        let version = store.schema_version()?;
        if version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: version,
                supported: CURRENT_SCHEMA_VERSION,
            }
            .into());
        }
        let Some(stored_params) = store.get_meta(MetaKey::Params)? else {
            tracing::info!("store holds no pool state; starting empty");
            return Pool::new(params, clock);
        };
        let stored_params: PoolParams = decode(Table::Meta, &stored_params)?;
        if stored_params != params {
            tracing::warn!("configured parameters differ from stored ones; using stored");
        }
        stored_params.validate()?;

        let mut accounts = BTreeMap::new();
        for (key, value) in store.iter(Table::Accounts)? {
            let id = MemberId::new(utf8_key(Table::Accounts, key)?);
            accounts.insert(id, decode::<TokenAccount>(Table::Accounts, &value)?);
        }

        let mut members = Vec::new();
        for (key, _) in store.iter(Table::Members)? {
            members.push(MemberId::new(utf8_key(Table::Members, key)?));
        }
        let members: MemberRoll = members.into_iter().collect();

        let mut locks = Vec::new();
        for (_, value) in store.iter(Table::Locks)? {
            locks.push(decode::<TokenLock>(Table::Locks, &value)?);
        }

        let mut deposits = Vec::new();
        for (_, value) in store.iter(Table::Deposits)? {
            deposits.push(decode::<StakeDeposit>(Table::Deposits, &value)?);
        }
        let mut cursors = BTreeMap::new();
        for (key, value) in store.iter(Table::Cursors)? {
            let contract = ContractAddress::new(utf8_key(Table::Cursors, key)?);
            let raw: [u8; 8] = value.as_slice().try_into().map_err(|_| {
                StoreError::Corruption(format!("cursor for {contract} has bad length"))
            })?;
            cursors.insert(contract, u64::from_be_bytes(raw) as usize);
        }
        let last_activity = match store.get_meta(MetaKey::LastActivity)? {
            Some(bytes) => decode::<Timestamp>(Table::Meta, &bytes)?,
            None => Timestamp::EPOCH,
        };
        let curve = UnlockCurve::new(&stored_params.unlock_curve)?;
        let staking = StakingLedger::restore(
            curve,
            stored_params.burn_scope,
            deposits,
            &cursors,
            last_activity,
        )?;

        let mut covers = Vec::new();
        for (_, value) in store.iter(Table::Covers)? {
            covers.push(decode::<Cover>(Table::Covers, &value)?);
        }
        let mut claims = Vec::new();
        for (_, value) in store.iter(Table::Claims)? {
            claims.push(decode::<Claim>(Table::Claims, &value)?);
        }

        let paused = store
            .get_meta(MetaKey::Paused)?
            .is_some_and(|bytes| bytes.first() == Some(&1));

        tracing::info!(
            members = members.len(),
            deposits = staking.deposit_count(),
            covers = covers.len(),
            claims = claims.len(),
            paused,
            "pool state loaded"
        );
        Ok(Pool::from_parts(
            stored_params,
            clock,
            accounts,
            members,
            LockRegistry::from_locks(locks),
            staking,
            ClaimsEngine::restore(covers, claims),
            paused,
            last_activity,
        ))
    }
}
