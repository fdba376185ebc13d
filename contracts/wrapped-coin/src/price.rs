use soroban_sdk::{contractclient, Address, Env};

use crate::{math, DataKey, WrappedCoinError};

/// Redemption price feed consumed by the wrapper.
#[contractclient(name = "OracleRelayerClient")]
pub trait OracleRelayerInterface {
    /// Last stored price, without accrual.
    fn get_current_redemption_price(env: Env) -> u128;
    /// Recomputes, stores and returns the latest price.
    fn redemption_price(env: Env) -> u128;
}

/// A price fetched from the oracle within the current invocation.
///
/// Only [`refresh`] hands these out, so every balance-moving conversion is
/// forced to sit behind a refresh.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RefreshedPrice(u128);

impl RefreshedPrice {
    pub fn ray(&self) -> u128 {
        self.0
    }

    pub fn to_external(&self, env: &Env, underlying: i128) -> Result<i128, WrappedCoinError> {
        math::scale_up(env, underlying, self.0)
    }

    pub fn to_underlying(&self, env: &Env, external: i128) -> Result<i128, WrappedCoinError> {
        math::scale_down(env, external, self.0)
    }
}

// ─── Cache ──────────────────────────────────────────────────────

pub fn oracle_address(env: &Env) -> Result<Address, WrappedCoinError> {
    env.storage()
        .instance()
        .get(&DataKey::Oracle)
        .ok_or(WrappedCoinError::NotInitialized)
}

/// Cached price; never contacts the oracle.
pub fn cached(env: &Env) -> Result<u128, WrappedCoinError> {
    env.storage()
        .instance()
        .get(&DataKey::RedemptionPrice)
        .ok_or(WrappedCoinError::NotInitialized)
}

/// Seeds the cache from the oracle's stored value at deployment.
pub fn seed(env: &Env) -> Result<u128, WrappedCoinError> {
    let oracle = oracle_address(env)?;
    let price = match OracleRelayerClient::new(env, &oracle).try_get_current_redemption_price() {
        Ok(Ok(price)) => price,
        _ => return Err(WrappedCoinError::OracleCallFailed),
    };
    store(env, price)?;
    Ok(price)
}

/// Pulls the authoritative price from the oracle and replaces the cache.
pub fn refresh(env: &Env) -> Result<RefreshedPrice, WrappedCoinError> {
    let oracle = oracle_address(env)?;
    let price = match OracleRelayerClient::new(env, &oracle).try_redemption_price() {
        Ok(Ok(price)) => price,
        _ => return Err(WrappedCoinError::OracleCallFailed),
    };
    store(env, price)?;
    Ok(RefreshedPrice(price))
}

fn store(env: &Env, price: u128) -> Result<(), WrappedCoinError> {
    if price == 0 {
        return Err(WrappedCoinError::InvalidPrice);
    }
    env.storage()
        .instance()
        .set(&DataKey::RedemptionPrice, &price);
    Ok(())
}
