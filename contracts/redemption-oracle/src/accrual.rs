use soroban_sdk::{Env, U256};

use crate::OracleError;

/// Fixed-point scale for prices and per-second rates: 27 decimals.
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

/// `a * b / RAY`, rounded half up.
pub fn rmul(env: &Env, a: u128, b: u128) -> Result<u128, OracleError> {
    U256::from_u128(env, a)
        .mul(&U256::from_u128(env, b))
        .add(&U256::from_u128(env, RAY / 2))
        .div(&U256::from_u128(env, RAY))
        .to_u128()
        .ok_or(OracleError::Overflow)
}

/// `base^exponent` in RAY fixed point, by repeated squaring.
pub fn rpow(env: &Env, base: u128, exponent: u64) -> Result<u128, OracleError> {
    let mut result = RAY;
    let mut square = base;
    let mut n = exponent;
    while n > 0 {
        if n & 1 == 1 {
            result = rmul(env, result, square)?;
        }
        n >>= 1;
        if n > 0 {
            square = rmul(env, square, square)?;
        }
    }
    Ok(result)
}

/// `price` compounded at `rate` per second for `elapsed` seconds.
pub fn accrue(env: &Env, price: u128, rate: u128, elapsed: u64) -> Result<u128, OracleError> {
    if elapsed == 0 || rate == RAY {
        return Ok(price);
    }
    rmul(env, rpow(env, rate, elapsed)?, price)
}
