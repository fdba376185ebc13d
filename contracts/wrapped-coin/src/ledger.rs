//! Underlying-unit bookkeeping. Balances and the aggregate live in the
//! fungible `Base` storage; nothing here knows about prices.

use soroban_sdk::{Address, Env};
use stellar_tokens::fungible::Base;

use crate::WrappedCoinError;

pub fn balance(env: &Env, account: &Address) -> i128 {
    Base::balance(env, account)
}

pub fn total(env: &Env) -> i128 {
    Base::total_supply(env)
}

/// Adds `amount` to `account` and to the aggregate.
pub fn credit(env: &Env, account: &Address, amount: i128) -> Result<(), WrappedCoinError> {
    require_non_negative(amount)?;
    total(env)
        .checked_add(amount)
        .ok_or(WrappedCoinError::Overflow)?;
    Base::update(env, None, Some(account), amount);
    Ok(())
}

/// Removes `amount` from `account` and from the aggregate.
pub fn debit(env: &Env, account: &Address, amount: i128) -> Result<(), WrappedCoinError> {
    require_covered(env, account, amount)?;
    Base::update(env, Some(account), None, amount);
    Ok(())
}

/// Moves `amount` between two accounts; the aggregate is untouched.
pub fn reallocate(
    env: &Env,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), WrappedCoinError> {
    require_covered(env, from, amount)?;
    Base::update(env, Some(from), Some(to), amount);
    Ok(())
}

fn require_non_negative(amount: i128) -> Result<(), WrappedCoinError> {
    if amount < 0 {
        return Err(WrappedCoinError::InvalidAmount);
    }
    Ok(())
}

fn require_covered(env: &Env, account: &Address, amount: i128) -> Result<(), WrappedCoinError> {
    require_non_negative(amount)?;
    if amount > balance(env, account) {
        return Err(WrappedCoinError::InsufficientBalance);
    }
    Ok(())
}
