use mutual_claims::{ClaimOutcome, ClaimStatus};
use mutual_nullables::NullClock;
use mutual_pool::persist::open_store;
use mutual_pool::{Caller, Pool, PoolConfig};
use mutual_store::PoolStore;
use mutual_types::{ContractAddress, CoverAsset, LockReason, MemberId, Timestamp, DAY_SECS};

fn id(name: &str) -> MemberId {
    MemberId::new(name)
}

fn insured() -> ContractAddress {
    ContractAddress::new("0x00000000000000000000000000000000000000bb")
}

fn config(dir: &std::path::Path) -> PoolConfig {
    PoolConfig {
        data_dir: dir.to_path_buf(),
        map_size_mb: 16,
        ..PoolConfig::default()
    }
}

#[test]
fn open_claim_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let claim = {
        let store = open_store(&config).unwrap();
        let mut pool = Pool::new(config.params.clone(), NullClock::new(0)).unwrap();
        for name in ["alice", "dave", "eve"] {
            pool.admit_member(&Caller::Governance, &id(name)).unwrap();
            pool.mint(&Caller::Governance, &id(name), 5_000).unwrap();
        }
        pool.stake(&id("alice"), &insured(), 2_000).unwrap();
        pool.lock(&id("eve"), LockReason::ClaimsAssessment, 1_000, 30 * DAY_SECS)
            .unwrap();
        let cover = pool
            .register_cover(
                &id("dave"),
                &insured(),
                CoverAsset::Eth,
                5_000,
                500,
                Timestamp::from_days(60),
            )
            .unwrap();
        pool.clock().set(DAY_SECS);
        let claim = pool.submit_claim(&id("dave"), cover).unwrap();
        pool.cast_assessor_vote(claim, &id("eve"), true).unwrap();
        pool.save_to_store(&store).unwrap();
        claim
    };

    let store = open_store(&config).unwrap();
    let mut pool =
        Pool::load_from_store(&store, config.params.clone(), NullClock::new(DAY_SECS)).unwrap();
    assert_eq!(
        pool.claims().claim(claim).unwrap().status,
        ClaimStatus::UnderCaVoting
    );
    assert_eq!(pool.claims().claim(claim).unwrap().ca_votes.len(), 1);

    pool.clock().set(4 * DAY_SECS);
    assert_eq!(pool.close_ca_vote(claim).unwrap(), Some(ClaimOutcome::Accepted));
    assert_eq!(pool.total_staked(&id("alice"), &insured()), 1_500);
}

#[test]
fn restored_pool_rejects_clock_behind_last_activity() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let store = open_store(&config).unwrap();

    let mut pool = Pool::new(config.params.clone(), NullClock::new(10 * DAY_SECS)).unwrap();
    pool.admit_member(&Caller::Governance, &id("alice")).unwrap();
    pool.mint(&Caller::Governance, &id("alice"), 100).unwrap();
    pool.stake(&id("alice"), &insured(), 100).unwrap();
    pool.save_to_store(&store).unwrap();

    let mut restored =
        Pool::load_from_store(&store, config.params.clone(), NullClock::new(DAY_SECS)).unwrap();
    assert!(restored.unlock_staker_unlockable_tokens(&id("alice")).is_err());
}

#[test]
fn snapshot_replaces_previous_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let store = open_store(&config).unwrap();

    let mut pool = Pool::new(config.params.clone(), NullClock::new(0)).unwrap();
    pool.admit_member(&Caller::Governance, &id("alice")).unwrap();
    pool.admit_member(&Caller::Governance, &id("bob")).unwrap();
    pool.save_to_store(&store).unwrap();
    pool.expel_member(&Caller::Governance, &id("bob")).unwrap();
    pool.save_to_store(&store).unwrap();

    assert_eq!(store.count(mutual_store::Table::Members).unwrap(), 1);
}
