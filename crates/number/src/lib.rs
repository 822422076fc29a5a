//! Conversions between EVM word-sized integers and arbitrary-precision
//! decimals.
//!
//! Monetary amounts in this workspace are always exact decimals; raw
//! on-chain integers enter the decimal domain through these helpers and
//! never through binary floats.

pub mod conversions;

pub use conversions::{u256_to_big_decimal, u256_to_big_decimal_scaled, u256_to_big_int};
