//! Covers bought against insured contracts.
//!
//! Covers are created by the quotation layer, which fixes the payout and the
//! stakers' liability (`stake_burn`). This module only keeps the records.

use crate::error::ClaimError;
use mutual_types::{ContractAddress, CoverAsset, CoverId, MemberId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    pub id: CoverId,
    pub owner: MemberId,
    pub insured_contract: ContractAddress,
    pub asset: CoverAsset,
    /// Payout in `asset` units if a claim is accepted.
    pub sum_assured: u128,
    /// Staked NXM burned on the insured contract when a claim is accepted.
    pub stake_burn: u128,
    pub valid_until: Timestamp,
    /// Set once a claim against this cover is accepted.
    pub paid: bool,
}

impl Cover {
    /// Whether a claim may still be filed at `now`.
    pub fn accepts_claims(&self, now: Timestamp, grace_secs: u64) -> bool {
        now < self.valid_until.plus(grace_secs)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CoverBook {
    covers: BTreeMap<CoverId, Cover>,
    next_id: u64,
}

impl CoverBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_covers(covers: impl IntoIterator<Item = Cover>) -> Self {
        let covers: BTreeMap<CoverId, Cover> = covers.into_iter().map(|c| (c.id, c)).collect();
        let next_id = covers.keys().next_back().map(|id| id.raw()).unwrap_or(0);
        Self { covers, next_id }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        owner: MemberId,
        insured_contract: ContractAddress,
        asset: CoverAsset,
        sum_assured: u128,
        stake_burn: u128,
        valid_until: Timestamp,
        now: Timestamp,
    ) -> Result<&Cover, ClaimError> {
        if sum_assured == 0 {
            return Err(ClaimError::InvalidAmount);
        }
        if valid_until <= now {
            return Err(ClaimError::InvalidValidity);
        }
        self.next_id += 1;
        let id = CoverId::new(self.next_id);
        let cover = Cover {
            id,
            owner,
            insured_contract,
            asset,
            sum_assured,
            stake_burn,
            valid_until,
            paid: false,
        };
        Ok(self.covers.entry(id).or_insert(cover))
    }

    pub fn get(&self, id: CoverId) -> Result<&Cover, ClaimError> {
        self.covers.get(&id).ok_or(ClaimError::CoverNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: CoverId) -> Result<&mut Cover, ClaimError> {
        self.covers.get_mut(&id).ok_or(ClaimError::CoverNotFound(id))
    }

    pub fn covers_of<'a>(&'a self, owner: &'a MemberId) -> impl Iterator<Item = &'a Cover> {
        self.covers.values().filter(move |c| &c.owner == owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cover> {
        self.covers.values()
    }

    pub fn len(&self) -> usize {
        self.covers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutual_types::DAY_SECS;

    fn book_with_cover() -> (CoverBook, CoverId) {
        let mut book = CoverBook::new();
        let id = book
            .register(
                MemberId::new("carol"),
                ContractAddress::new("0x00000000000000000000000000000000000000aa"),
                CoverAsset::Eth,
                10,
                500,
                Timestamp::from_days(30),
                Timestamp::EPOCH,
            )
            .unwrap()
            .id;
        (book, id)
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let (mut book, first) = book_with_cover();
        assert_eq!(first, CoverId::new(1));
        let second = book
            .register(
                MemberId::new("dave"),
                ContractAddress::new("0x00000000000000000000000000000000000000bb"),
                CoverAsset::Erc20 {
                    symbol: "DAI".into(),
                    decimals: 18,
                },
                5,
                100,
                Timestamp::from_days(10),
                Timestamp::EPOCH,
            )
            .unwrap()
            .id;
        assert_eq!(second, CoverId::new(2));
    }

    #[test]
    fn restored_book_continues_numbering() {
        let (book, _) = book_with_cover();
        let mut restored = CoverBook::from_covers(book.iter().cloned());
        let next = restored
            .register(
                MemberId::new("erin"),
                ContractAddress::new("0x00000000000000000000000000000000000000cc"),
                CoverAsset::Eth,
                1,
                1,
                Timestamp::from_days(1),
                Timestamp::EPOCH,
            )
            .unwrap()
            .id;
        assert_eq!(next, CoverId::new(2));
    }

    #[test]
    fn rejects_zero_sum_and_past_expiry() {
        let mut book = CoverBook::new();
        let owner = MemberId::new("carol");
        let contract = ContractAddress::new("0x00000000000000000000000000000000000000aa");
        assert_eq!(
            book.register(owner.clone(), contract.clone(), CoverAsset::Eth, 0, 1, Timestamp::from_days(1), Timestamp::EPOCH)
                .unwrap_err(),
            ClaimError::InvalidAmount
        );
        assert_eq!(
            book.register(owner, contract, CoverAsset::Eth, 1, 1, Timestamp::from_days(1), Timestamp::from_days(1))
                .unwrap_err(),
            ClaimError::InvalidValidity
        );
    }

    #[test]
    fn grace_period_extends_claim_window() {
        let (book, id) = book_with_cover();
        let cover = book.get(id).unwrap();
        assert!(cover.accepts_claims(Timestamp::from_days(29), 0));
        assert!(!cover.accepts_claims(Timestamp::from_days(30), 0));
        assert!(cover.accepts_claims(Timestamp::from_days(31), 2 * DAY_SECS));
    }
}
