use soroban_sdk::{Env, U256};

use crate::WrappedCoinError;

/// Fixed-point scale of every redemption price: 27 decimals.
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

const TENTH_RAY: u128 = RAY / 10;
const TEN_RAY: u128 = RAY * 10;

// ─── Conversions ────────────────────────────────────────────────

/// External amount credited for `underlying` units at `price`:
/// `underlying * price / RAY`, rounded half up.
pub fn scale_up(env: &Env, underlying: i128, price: u128) -> Result<i128, WrappedCoinError> {
    let amount = unsigned(underlying)?;
    round_tenths(env, amount, price, TENTH_RAY)
}

/// Underlying units whose scaled value is `external` at `price`:
/// `external * RAY / price`, rounded half up.
pub fn scale_down(env: &Env, external: i128, price: u128) -> Result<i128, WrappedCoinError> {
    if price == 0 {
        return Err(WrappedCoinError::InvalidPrice);
    }
    let amount = unsigned(external)?;
    round_tenths(env, amount, TEN_RAY, price)
}

// ─── Helpers ────────────────────────────────────────────────────

fn unsigned(amount: i128) -> Result<u128, WrappedCoinError> {
    u128::try_from(amount).map_err(|_| WrappedCoinError::InvalidAmount)
}

/// `a * b / denominator` is the result expressed in tenths of a unit.
/// A tenths digit of 5 or more rounds up; anything below is truncated.
fn round_tenths(
    env: &Env,
    a: u128,
    b: u128,
    denominator: u128,
) -> Result<i128, WrappedCoinError> {
    let ten = U256::from_u32(env, 10);
    // u128 * u128 always fits in 256 bits
    let tenths = U256::from_u128(env, a)
        .mul(&U256::from_u128(env, b))
        .div(&U256::from_u128(env, denominator));
    let whole = tenths.div(&ten);
    let digit = tenths
        .sub(&whole.mul(&ten))
        .to_u128()
        .ok_or(WrappedCoinError::Overflow)?;

    let whole = whole.to_u128().ok_or(WrappedCoinError::Overflow)?;
    let rounded = if digit >= 5 {
        whole.checked_add(1).ok_or(WrappedCoinError::Overflow)?
    } else {
        whole
    };
    i128::try_from(rounded).map_err(|_| WrappedCoinError::Overflow)
}
