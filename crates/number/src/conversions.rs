use {
    alloy_primitives::U256,
    bigdecimal::{
        BigDecimal,
        num_bigint::{BigInt, Sign},
    },
};

pub fn u256_to_big_int(value: &U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

pub fn u256_to_big_decimal(value: &U256) -> BigDecimal {
    BigDecimal::new(u256_to_big_int(value), 0)
}

/// Interprets `value` as a fixed-point number with `decimals` fractional
/// digits. The result is exact: `u256_to_big_decimal_scaled(v, d) * 10^d`
/// recovers `v`.
pub fn u256_to_big_decimal_scaled(value: &U256, decimals: u32) -> BigDecimal {
    BigDecimal::new(u256_to_big_int(value), i64::from(decimals))
}
