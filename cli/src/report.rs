//! Plain-text report of pool state.

use std::fmt::Write;

use mutual_claims::ClaimStatus;
use mutual_nullables::Clock;
use mutual_pool::Pool;
use mutual_types::Timestamp;
use mutual_utils::{format_duration, format_tokens};

/// Decimals of the pool token when shown to humans.
pub const TOKEN_DECIMALS: u8 = 18;

pub fn render<C: Clock>(pool: &Pool<C>, raw_amounts: bool) -> String {
    let amount = |raw: u128| {
        if raw_amounts {
            raw.to_string()
        } else {
            format_tokens(raw, TOKEN_DECIMALS)
        }
    };
    let now = pool.now();
    let mut out = String::new();

    let _ = writeln!(out, "pool at {now}{}", if pool.is_paused() { " (paused)" } else { "" });
    let _ = writeln!(
        out,
        "bonding period {}, burn scope {:?}",
        format_duration(pool.staking().curve().bonding_period_secs()),
        pool.staking().burn_scope()
    );

    let _ = writeln!(out, "\nmembers ({})", pool.members().len());
    for (id, account) in pool.accounts() {
        let marker = if pool.is_member(id) { "" } else { " [former]" };
        let _ = writeln!(
            out,
            "  {id}{marker}: spendable {}, locked {}, unlockable stake {}",
            amount(account.spendable),
            amount(pool.tokens_locked_total(id)),
            amount(pool.unlockable_amount(id).unwrap_or(0)),
        );
    }

    let contracts = pool.staking().cursors();
    let _ = writeln!(out, "\ncontracts ({})", contracts.len());
    for (contract, cursor) in &contracts {
        let stakers = pool.staking().contract_stakers(contract);
        let at_risk: u128 = stakers
            .keys()
            .map(|s| pool.still_staked(s, contract))
            .sum();
        let _ = writeln!(
            out,
            "  {contract}: {} stakers, still staked {}, burnable {}, cursor {cursor}",
            stakers.len(),
            amount(at_risk),
            amount(pool.burnable(contract).unwrap_or(0)),
        );
    }

    let claims: Vec<_> = pool.claims().claims().collect();
    let _ = writeln!(out, "\nclaims ({})", claims.len());
    for claim in claims {
        let detail = match (claim.status, claim.outcome) {
            (ClaimStatus::Closed, Some(outcome)) => {
                format!("{outcome:?}, burned {}", amount(claim.burned))
            }
            (ClaimStatus::UnderCaVoting, _) => {
                format!("assessors vote until {}", remaining(now, claim.ca_closes_at))
            }
            (status, _) => match claim.member_closes_at {
                Some(at) if status.is_open() => {
                    format!("members vote until {}", remaining(now, at))
                }
                _ => format!("{status:?}"),
            },
        };
        let _ = writeln!(out, "  {} on {}: {detail}", claim.id, claim.cover);
    }
    out
}

fn remaining(now: Timestamp, deadline: Timestamp) -> String {
    let left = now.elapsed_since(deadline);
    if left == 0 {
        format!("{deadline} (closed)")
    } else {
        format!("{deadline} ({} left)", format_duration(left))
    }
}
