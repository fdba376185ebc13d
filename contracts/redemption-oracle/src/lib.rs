#![no_std]

use soroban_sdk::{contract, contracterror, contractevent, contractimpl, contracttype, Address, Env};
use stellar_access::ownable::{self, Ownable};
use stellar_macros::only_owner;

mod accrual;
#[cfg(test)]
mod test;

pub use accrual::RAY;

// TTL constants: extend instance storage proactively to prevent archival
const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

/// Upper bound on the per-second redemption rate: doubling every second.
pub const MAX_REDEMPTION_RATE: u128 = 2 * RAY;

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    RedemptionPrice,
    RedemptionRate,
    LastUpdate,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum OracleError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    InvalidPrice = 3,
    InvalidRate = 4,
    Overflow = 5,
}

// ─── Events ──────────────────────────────────────────────────────

/// Emitted whenever the stored redemption price actually changes.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateRedemptionPrice {
    pub redemption_price: u128,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct RedemptionOracle;

// ─── Helpers ─────────────────────────────────────────────────────

fn stored_price(env: &Env) -> Result<u128, OracleError> {
    env.storage()
        .instance()
        .get(&DataKey::RedemptionPrice)
        .ok_or(OracleError::NotInitialized)
}

fn stored_rate(env: &Env) -> Result<u128, OracleError> {
    env.storage()
        .instance()
        .get(&DataKey::RedemptionRate)
        .ok_or(OracleError::NotInitialized)
}

fn check_price(price: u128) -> Result<(), OracleError> {
    if price == 0 {
        return Err(OracleError::InvalidPrice);
    }
    Ok(())
}

fn check_rate(rate: u128) -> Result<(), OracleError> {
    if rate == 0 || rate > MAX_REDEMPTION_RATE {
        return Err(OracleError::InvalidRate);
    }
    Ok(())
}

fn write_price(env: &Env, price: u128) {
    let previous: Option<u128> = env.storage().instance().get(&DataKey::RedemptionPrice);
    env.storage()
        .instance()
        .set(&DataKey::RedemptionPrice, &price);
    env.storage()
        .instance()
        .set(&DataKey::LastUpdate, &env.ledger().timestamp());
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);

    if previous != Some(price) {
        UpdateRedemptionPrice {
            redemption_price: price,
        }
        .publish(env);
    }
}

/// Compounds the stored price up to the current ledger time and persists it.
fn update(env: &Env) -> Result<u128, OracleError> {
    let price = stored_price(env)?;
    let rate = stored_rate(env)?;
    let last: u64 = env
        .storage()
        .instance()
        .get(&DataKey::LastUpdate)
        .unwrap_or(0);
    let elapsed = env.ledger().timestamp().saturating_sub(last);

    let accrued = accrual::accrue(env, price, rate, elapsed)?;
    check_price(accrued)?;
    write_price(env, accrued);
    Ok(accrued)
}

// Ownable (2-step transfer)
#[contractimpl(contracttrait)]
impl Ownable for RedemptionOracle {}

// ─── Implementation ──────────────────────────────────────────────

#[contractimpl]
impl RedemptionOracle {
    /// `redemption_price` and `redemption_rate` are RAY fixed point; the rate
    /// is applied per second (RAY = no drift).
    pub fn initialize(
        env: Env,
        owner: Address,
        redemption_price: u128,
        redemption_rate: u128,
    ) -> Result<(), OracleError> {
        if env.storage().instance().has(&DataKey::RedemptionPrice) {
            return Err(OracleError::AlreadyInitialized);
        }
        check_price(redemption_price)?;
        check_rate(redemption_rate)?;

        ownable::set_owner(&env, &owner);
        env.storage()
            .instance()
            .set(&DataKey::RedemptionRate, &redemption_rate);
        write_price(&env, redemption_price);
        Ok(())
    }

    /// Stored price, without accruing.
    pub fn get_current_redemption_price(env: Env) -> Result<u128, OracleError> {
        stored_price(&env)
    }

    /// Accrues, stores and returns the latest redemption price.
    pub fn redemption_price(env: Env) -> Result<u128, OracleError> {
        update(&env)
    }

    pub fn redemption_rate(env: Env) -> Result<u128, OracleError> {
        stored_rate(&env)
    }

    /// Ledger timestamp of the last stored price.
    pub fn last_update(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::LastUpdate)
            .unwrap_or(0)
    }

    #[only_owner]
    pub fn set_redemption_price(env: Env, price: u128) -> Result<(), OracleError> {
        check_price(price)?;
        write_price(&env, price);
        Ok(())
    }

    /// Settles accrual at the old rate before switching.
    ///
    /// If that accrual fails (the price decayed to zero or overflowed), the
    /// rate cannot change until `set_redemption_price` resets the price and
    /// the accrual clock.
    #[only_owner]
    pub fn set_redemption_rate(env: Env, rate: u128) -> Result<(), OracleError> {
        check_rate(rate)?;
        update(&env)?;
        env.storage()
            .instance()
            .set(&DataKey::RedemptionRate, &rate);
        Ok(())
    }
}
