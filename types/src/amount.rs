//! Serde adapter for raw token amounts.
//!
//! TOML has no 128-bit integers. In human-readable formats an amount is
//! written as an integer when it fits in `i64` and as a decimal string
//! otherwise; either form is accepted on input. Binary formats keep `u128`.
//!
//! ```ignore
//! #[serde(with = "mutual_types::amount")]
//! pub stake_burn: u128,
//! ```

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    if !serializer.is_human_readable() {
        return serializer.serialize_u128(*value);
    }
    match i64::try_from(*value) {
        Ok(v) => serializer.serialize_i64(v),
        Err(_) => serializer.serialize_str(&value.to_string()),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    if deserializer.is_human_readable() {
        deserializer.deserialize_any(AmountVisitor)
    } else {
        deserializer.deserialize_u128(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = u128;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(u128::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
        u128::try_from(v).map_err(|_| E::custom(format!("amount must be non-negative, got {v}")))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        v.trim().parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        amount: u128,
    }

    #[test]
    fn small_amounts_are_plain_integers() {
        let json = serde_json::to_string(&Holder { amount: 2500 }).unwrap();
        assert_eq!(json, r#"{"amount":2500}"#);
    }

    #[test]
    fn large_amounts_round_trip_as_strings() {
        let big = Holder {
            amount: 2_500 * 10u128.pow(18) * 10u128.pow(6),
        };
        let json = serde_json::to_string(&big).unwrap();
        assert!(json.contains('"'));
        assert_eq!(serde_json::from_str::<Holder>(&json).unwrap(), big);
    }

    #[test]
    fn binary_formats_keep_u128() {
        let value = Holder { amount: u128::MAX };
        let bytes = bincode::serialize(&value).unwrap();
        assert_eq!(bincode::deserialize::<Holder>(&bytes).unwrap(), value);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(serde_json::from_str::<Holder>(r#"{"amount":-1}"#).is_err());
    }
}
