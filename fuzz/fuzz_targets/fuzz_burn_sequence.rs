#![no_main]

use libfuzzer_sys::fuzz_target;

use mutual_staking::{StakingLedger, UnlockCurve};
use mutual_types::{BurnScope, ContractAddress, MemberId, Timestamp, TokenAccount, DAY_SECS};

// Drive the staking ledger with arbitrary stake / burn / unlock sequences.
// Every 8-byte chunk is one operation. The ledger must never panic and must
// conserve tokens: spendable + still staked + burned == minted.
fuzz_target!(|data: &[u8]| {
    let Some((&scope, ops)) = data.split_first() else {
        return;
    };
    let scope = if scope & 1 == 0 {
        BurnScope::LockedPrincipal
    } else {
        BurnScope::FullPrincipal
    };
    let Ok(curve) = UnlockCurve::linear(250 * DAY_SECS) else {
        return;
    };
    let mut ledger = StakingLedger::new(curve, scope);

    const MINTED: u128 = 1_000_000;
    let stakers: Vec<MemberId> = (0..4).map(|i| MemberId::new(format!("m{i}"))).collect();
    let contracts: Vec<ContractAddress> = (0..2)
        .map(|i| ContractAddress::new(format!("0x{:040x}", i + 1)))
        .collect();
    let mut accounts = vec![TokenAccount::new(MINTED); stakers.len()];
    let mut now = 0u64;

    for chunk in ops.chunks_exact(8) {
        let who = usize::from(chunk[1]) % stakers.len();
        let contract = &contracts[usize::from(chunk[2]) % contracts.len()];
        let amount = u128::from(u32::from_le_bytes([chunk[3], chunk[4], chunk[5], chunk[6]]) % 50_000);
        now = now.saturating_add(u64::from(chunk[7]) * DAY_SECS / 4);
        let at = Timestamp::new(now);

        match chunk[0] % 3 {
            0 => {
                let _ = ledger.stake(&stakers[who], &mut accounts[who], contract, amount, at);
            }
            1 => {
                let _ = ledger.burn(contract, amount, at);
            }
            _ => {
                let _ = ledger.unlock_staker_unlockable_tokens(&stakers[who], &mut accounts[who], at);
            }
        }
    }

    let spendable: u128 = accounts.iter().map(|a| a.spendable).sum();
    let staked: u128 = ledger.iter_deposits().map(|d| d.still_staked()).sum();
    let burned: u128 = ledger.iter_deposits().map(|d| d.burned).sum();
    assert_eq!(spendable + staked + burned, MINTED * stakers.len() as u128);
    assert!(ledger.iter_deposits().all(|d| d.is_consistent()));
});
