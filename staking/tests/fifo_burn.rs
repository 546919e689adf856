//! Burn ordering scenarios over the public staking API.

use mutual_staking::{StakingError, StakingLedger, UnlockCurve};
use mutual_types::{BurnScope, ContractAddress, MemberId, Timestamp, TokenAccount, DAY_SECS};

fn staker(n: u8) -> MemberId {
    MemberId::new(format!("staker-{n}"))
}

fn insured() -> ContractAddress {
    ContractAddress::new("0x1111111111111111111111111111111111111111")
}

fn legacy_ledger() -> StakingLedger {
    StakingLedger::new(
        UnlockCurve::linear(250 * DAY_SECS).unwrap(),
        BurnScope::LockedPrincipal,
    )
}

#[test]
fn three_stakers_fifo_burn_reference_fixture() {
    let mut ledger = legacy_ledger();
    let mut accounts = [
        TokenAccount::new(2500),
        TokenAccount::new(2500),
        TokenAccount::new(2500),
    ];
    let mut ids = Vec::new();
    for (i, day) in [0u64, 10, 20].into_iter().enumerate() {
        let id = ledger
            .stake(
                &staker(i as u8 + 1),
                &mut accounts[i],
                &insured(),
                2500,
                Timestamp::from_days(day),
            )
            .unwrap()
            .id;
        ids.push(id);
    }

    let receipt = ledger.burn(&insured(), 4000, Timestamp::from_days(20)).unwrap();

    assert_eq!(receipt.burned_from(ids[0]), 2300);
    assert_eq!(receipt.burned_from(ids[1]), 1700);
    assert_eq!(receipt.burned_from(ids[2]), 0);
    assert_eq!(ledger.deposit(ids[2]).unwrap().burned, 0);
    assert_eq!(receipt.cursor, 1);

    let per = receipt.per_staker();
    assert_eq!(per.get(&staker(1)), Some(&2300));
    assert_eq!(per.get(&staker(2)), Some(&1700));
    assert_eq!(per.get(&staker(3)), None);

    assert_eq!(ledger.total_staked(&staker(1), &insured()), 200);
    assert_eq!(ledger.total_staked(&staker(2), &insured()), 800);
    assert_eq!(ledger.total_staked(&staker(3), &insured()), 2500);
}

#[test]
fn burned_deposit_unlocks_only_its_remaining_principal() {
    let mut ledger = legacy_ledger();
    let mut acct = TokenAccount::new(2500);
    ledger
        .stake(&staker(1), &mut acct, &insured(), 2500, Timestamp::EPOCH)
        .unwrap();
    ledger.burn(&insured(), 2300, Timestamp::from_days(20)).unwrap();

    // 200 unburned left, 8% of it vested at day 20.
    assert_eq!(
        ledger
            .unlockable_amount(&staker(1), Timestamp::from_days(20))
            .unwrap(),
        16
    );
    let paid = ledger
        .unlock_staker_unlockable_tokens(&staker(1), &mut acct, Timestamp::from_days(400))
        .unwrap();
    assert_eq!(paid, 200);
    assert_eq!(acct.spendable, 200);
}

#[test]
fn locked_scope_cannot_burn_vested_principal() {
    let mut ledger = legacy_ledger();
    let mut acct = TokenAccount::new(1000);
    ledger
        .stake(&staker(1), &mut acct, &insured(), 1000, Timestamp::EPOCH)
        .unwrap();
    assert_eq!(ledger.burnable(&insured(), Timestamp::from_days(250)).unwrap(), 0);
    assert!(matches!(
        ledger.burn(&insured(), 1, Timestamp::from_days(250)),
        Err(StakingError::InsufficientStake { available: 0, .. })
    ));
}

#[test]
fn repeated_burns_walk_the_queue_in_order() {
    let mut ledger = StakingLedger::new(
        UnlockCurve::linear(250 * DAY_SECS).unwrap(),
        BurnScope::FullPrincipal,
    );
    let mut ids = Vec::new();
    for n in 1..=4u8 {
        let mut acct = TokenAccount::new(100);
        ids.push(
            ledger
                .stake(&staker(n), &mut acct, &insured(), 100, Timestamp::EPOCH)
                .unwrap()
                .id,
        );
    }
    for _ in 0..7 {
        ledger.burn(&insured(), 50, Timestamp::from_days(1)).unwrap();
    }
    let burned: Vec<u128> = ids
        .iter()
        .map(|id| ledger.deposit(*id).unwrap().burned)
        .collect();
    assert_eq!(burned, vec![100, 100, 100, 50]);
    assert_eq!(ledger.contract_index(&insured()).unwrap().cursor, 3);
}
