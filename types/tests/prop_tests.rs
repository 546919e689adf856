use proptest::prelude::*;

use mutual_types::{DepositId, Timestamp, TokenAccount};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Deposit key bytes order exactly like the ids they encode.
    #[test]
    fn deposit_key_order_matches_id_order(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ka = DepositId::new(a).to_key();
        let kb = DepositId::new(b).to_key();
        prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
    }

    /// Timestamp bincode serialization roundtrip.
    #[test]
    fn timestamp_bincode_roundtrip(secs in 0u64..u64::MAX) {
        let ts = Timestamp::new(secs);
        let encoded = bincode::serialize(&ts).unwrap();
        let decoded: Timestamp = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, ts);
    }

    /// Debit then credit of the same amount restores the balance.
    #[test]
    fn debit_credit_restores_balance(start in 0u128..u128::MAX / 2, amount in 0u128..u128::MAX / 2) {
        let mut acct = TokenAccount::new(start);
        if acct.debit(amount).is_ok() {
            acct.credit(amount).unwrap();
        }
        prop_assert_eq!(acct.spendable, start);
    }
}
