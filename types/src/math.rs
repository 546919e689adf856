//! Wide integer helpers.
//!
//! Amounts are `u128`, so products such as `principal * bps` can exceed the
//! native width. These go through `BigUint` and narrow the result back.

use num_bigint::BigUint;

/// `floor(a * b / c)`, exact for any `u128` inputs.
///
/// Returns `None` if `c == 0` or the quotient does not fit in `u128`.
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let quotient = BigUint::from(a) * BigUint::from(b) / BigUint::from(c);
    u128::try_from(quotient).ok()
}

/// Sum of `values` without overflow.
pub fn wide_sum<I: IntoIterator<Item = u128>>(values: I) -> BigUint {
    values.into_iter().map(BigUint::from).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_naive_for_small_values() {
        for (a, b, c) in [(2500u128, 20u128, 250u128), (7, 3, 2), (0, 5, 9), (10, 0, 3)] {
            assert_eq!(mul_div_floor(a, b, c), Some(a * b / c));
        }
    }

    #[test]
    fn product_wider_than_u128_is_exact() {
        let a = u128::MAX / 3;
        assert_eq!(mul_div_floor(a, 10_000, 10_000), Some(a));
        assert_eq!(mul_div_floor(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
        let quarter = u128::MAX / 4;
        assert_eq!(mul_div_floor(quarter, 10_000, quarter * 2), Some(5_000));
    }

    #[test]
    fn zero_divisor_or_oversized_quotient_is_none() {
        assert_eq!(mul_div_floor(1, 1, 0), None);
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), None);
    }

    #[test]
    fn wide_sum_does_not_saturate() {
        let sum = wide_sum([u128::MAX, u128::MAX]);
        assert_eq!(sum, BigUint::from(u128::MAX) * 2u32);
    }
}
