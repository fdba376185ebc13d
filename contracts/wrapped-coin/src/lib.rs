#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error,
    token::{self, TokenInterface},
    Address, Env, MuxedAddress, String,
};
use stellar_tokens::fungible::Base;

mod events;
mod ledger;
mod math;
mod price;

pub use math::RAY;
pub use price::{OracleRelayerClient, OracleRelayerInterface};

use price::RefreshedPrice;

// TTL constants: extend instance storage proactively to prevent archival
const TTL_THRESHOLD: u32 = 17_280; // ~1 day at 5s/ledger
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

// ─── Storage Keys ────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    Underlying,
    Oracle,
    RedemptionPrice,
}

// ─── Errors ──────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum WrappedCoinError {
    InsufficientBalance = 1,
    InsufficientAllowance = 2,
    Overflow = 3,
    InvalidPrice = 4,
    OracleCallFailed = 5,
    UnderlyingTransferFailed = 6,
    InvalidAmount = 7,
    AmountTooSmall = 8,
    AlreadyInitialized = 9,
    NotInitialized = 10,
}

// ─── Contract ────────────────────────────────────────────────────

#[contract]
pub struct WrappedCoin;

// ─── Helpers ─────────────────────────────────────────────────────

fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

fn underlying_address(env: &Env) -> Result<Address, WrappedCoinError> {
    env.storage()
        .instance()
        .get(&DataKey::Underlying)
        .ok_or(WrappedCoinError::NotInitialized)
}

fn underlying_token(env: &Env) -> Result<token::Client<'_>, WrappedCoinError> {
    Ok(token::Client::new(env, &underlying_address(env)?))
}

fn require_positive(amount: i128) -> Result<(), WrappedCoinError> {
    if amount <= 0 {
        return Err(WrappedCoinError::InvalidAmount);
    }
    Ok(())
}

/// Underlying units `holder` gives up for `external` at `price`.
///
/// Half-up rounding on both conversions can leave the visible balance worth a
/// fraction more than what is held. A request within the visible balance is
/// capped at the whole holding so a full exit always clears.
fn underlying_for(
    env: &Env,
    holder: &Address,
    external: i128,
    price: &RefreshedPrice,
) -> Result<i128, WrappedCoinError> {
    let underlying = price.to_underlying(env, external)?;
    let held = ledger::balance(env, holder);
    if underlying > held && external <= price.to_external(env, held)? {
        return Ok(held);
    }
    Ok(underlying)
}

fn spend_allowance(
    env: &Env,
    from: &Address,
    spender: &Address,
    amount: i128,
) -> Result<(), WrappedCoinError> {
    if amount < 0 {
        return Err(WrappedCoinError::InvalidAmount);
    }
    if Base::allowance(env, from, spender) < amount {
        return Err(WrappedCoinError::InsufficientAllowance);
    }
    Base::spend_allowance(env, from, spender, amount);
    Ok(())
}

fn deposit(
    env: &Env,
    caller: &Address,
    account: &Address,
    amount: i128,
) -> Result<(), WrappedCoinError> {
    require_positive(amount)?;
    let token = underlying_token(env)?;
    let custody = env.current_contract_address();

    let available = match token.try_balance(caller) {
        Ok(Ok(balance)) => balance,
        _ => return Err(WrappedCoinError::UnderlyingTransferFailed),
    };
    if available < amount {
        return Err(WrappedCoinError::InsufficientBalance);
    }
    // Pull before any ledger write: nothing half-applied is visible to the token.
    if !matches!(token.try_transfer(caller, &custody, &amount), Ok(Ok(()))) {
        return Err(WrappedCoinError::UnderlyingTransferFailed);
    }

    let price = price::refresh(env)?;
    ledger::credit(env, account, amount)?;
    let external = price.to_external(env, amount)?;
    extend_instance_ttl(env);

    events::Mint {
        account: account.clone(),
        amount: external,
        underlying_amount: amount,
    }
    .publish(env);
    Ok(())
}

fn withdraw(env: &Env, from: &Address, amount: i128) -> Result<(), WrappedCoinError> {
    require_positive(amount)?;
    let price = price::refresh(env)?;
    let underlying = underlying_for(env, from, amount, &price)?;
    if underlying == 0 {
        return Err(WrappedCoinError::AmountTooSmall);
    }
    // Debit is committed before custody leaves the contract.
    ledger::debit(env, from, underlying)?;

    let token = underlying_token(env)?;
    let custody = env.current_contract_address();
    if !matches!(token.try_transfer(&custody, from, &underlying), Ok(Ok(()))) {
        return Err(WrappedCoinError::UnderlyingTransferFailed);
    }
    extend_instance_ttl(env);

    events::Burn {
        account: from.clone(),
        amount,
        underlying_amount: underlying,
    }
    .publish(env);
    Ok(())
}

fn move_balance(
    env: &Env,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), WrappedCoinError> {
    if amount < 0 {
        return Err(WrappedCoinError::InvalidAmount);
    }
    let price = price::refresh(env)?;
    let underlying = underlying_for(env, from, amount, &price)?;
    ledger::reallocate(env, from, to, underlying)?;
    extend_instance_ttl(env);

    events::Transfer {
        from: from.clone(),
        to: to.clone(),
        amount,
        underlying_amount: underlying,
    }
    .publish(env);
    Ok(())
}

fn scaled(env: &Env, underlying: i128) -> Result<i128, WrappedCoinError> {
    math::scale_up(env, underlying, price::cached(env)?)
}

// ─── SEP-41 Token Interface (canonical trait for indexer detection) ──

#[contractimpl]
impl TokenInterface for WrappedCoin {
    fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        Base::allowance(&env, &from, &spender)
    }

    fn approve(env: Env, from: Address, spender: Address, amount: i128, expiration_ledger: u32) {
        if amount < 0 {
            panic_with_error!(&env, WrappedCoinError::InvalidAmount);
        }
        Base::approve(&env, &from, &spender, amount, expiration_ledger);
    }

    /// Underlying balance scaled by the cached redemption price.
    fn balance(env: Env, id: Address) -> i128 {
        scaled(&env, ledger::balance(&env, &id)).unwrap_or_else(|e| panic_with_error!(&env, e))
    }

    fn transfer(env: Env, from: Address, to: MuxedAddress, amount: i128) {
        from.require_auth();
        move_balance(&env, &from, &to.address(), amount)
            .unwrap_or_else(|e| panic_with_error!(&env, e));
    }

    fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();
        spend_allowance(&env, &from, &spender, amount)
            .and_then(|_| move_balance(&env, &from, &to, amount))
            .unwrap_or_else(|e| panic_with_error!(&env, e));
    }

    /// Burns `amount` of external balance and releases the matching
    /// underlying back to `from`.
    fn burn(env: Env, from: Address, amount: i128) {
        from.require_auth();
        withdraw(&env, &from, amount).unwrap_or_else(|e| panic_with_error!(&env, e));
    }

    fn burn_from(env: Env, spender: Address, from: Address, amount: i128) {
        spender.require_auth();
        spend_allowance(&env, &from, &spender, amount)
            .and_then(|_| withdraw(&env, &from, amount))
            .unwrap_or_else(|e| panic_with_error!(&env, e));
    }

    fn decimals(env: Env) -> u32 {
        Base::decimals(&env)
    }

    fn name(env: Env) -> String {
        Base::name(&env)
    }

    fn symbol(env: Env) -> String {
        Base::symbol(&env)
    }
}

// ─── Wrapper-Specific Functions ──────────────────────────────────

#[contractimpl]
impl WrappedCoin {
    pub fn initialize(
        env: Env,
        underlying: Address,
        oracle: Address,
        name: String,
        symbol: String,
        decimals: u32,
    ) -> Result<(), WrappedCoinError> {
        if env.storage().instance().has(&DataKey::Underlying) {
            return Err(WrappedCoinError::AlreadyInitialized);
        }
        env.storage()
            .instance()
            .set(&DataKey::Underlying, &underlying);
        env.storage().instance().set(&DataKey::Oracle, &oracle);
        price::seed(&env)?;
        Base::set_metadata(&env, decimals, name, symbol);
        extend_instance_ttl(&env);
        Ok(())
    }

    /// Deposits `amount` underlying from `caller`, credited to `account`.
    pub fn mint(
        env: Env,
        caller: Address,
        account: Address,
        amount: i128,
    ) -> Result<(), WrappedCoinError> {
        caller.require_auth();
        deposit(&env, &caller, &account, amount)
    }

    /// Total supply scaled by the cached redemption price.
    pub fn total_supply(env: Env) -> i128 {
        scaled(&env, ledger::total(&env)).unwrap_or_else(|e| panic_with_error!(&env, e))
    }

    pub fn balance_of_underlying(env: Env, id: Address) -> i128 {
        ledger::balance(&env, &id)
    }

    pub fn total_supply_underlying(env: Env) -> i128 {
        ledger::total(&env)
    }

    /// Refreshes the cached price from the oracle and returns it.
    pub fn redemption_price(env: Env) -> Result<u128, WrappedCoinError> {
        let price = price::refresh(&env)?;
        extend_instance_ttl(&env);
        Ok(price.ray())
    }

    /// Cached redemption price, as of the last refresh.
    pub fn get_redemption_price(env: Env) -> Result<u128, WrappedCoinError> {
        price::cached(&env)
    }

    pub fn underlying(env: Env) -> Result<Address, WrappedCoinError> {
        underlying_address(&env)
    }

    pub fn oracle(env: Env) -> Result<Address, WrappedCoinError> {
        price::oracle_address(&env)
    }
}
