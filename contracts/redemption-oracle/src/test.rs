#![cfg(test)]

use soroban_sdk::testutils::{Address as _, Events, Ledger};
use soroban_sdk::{Address, Env, Map, Symbol, TryFromVal, Vec};

use crate::{OracleError, RedemptionOracle, RedemptionOracleClient, MAX_REDEMPTION_RATE, RAY};

const PRICE: u128 = 3 * RAY;
const ONE_PERCENT: u128 = RAY + RAY / 100;

fn setup(rate: u128) -> (Env, RedemptionOracleClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(10_000);

    let contract_id = env.register(RedemptionOracle, ());
    let client = RedemptionOracleClient::new(&env, &contract_id);

    let owner = Address::generate(&env);
    client.initialize(&owner, &PRICE, &rate);

    (env, client, owner)
}

/// Prices carried by `update_redemption_price` events of the last call.
fn price_updates(env: &Env, oracle: &Address) -> Vec<u128> {
    let kind = Symbol::new(env, "update_redemption_price");
    let field = Symbol::new(env, "redemption_price");
    let mut prices = Vec::new(env);
    for (contract, topics, data) in env.events().all().iter() {
        if contract != *oracle {
            continue;
        }
        let Some(Ok(name)) = topics.get(0).map(|t| Symbol::try_from_val(env, &t)) else {
            continue;
        };
        if name != kind {
            continue;
        }
        let payload = Map::<Symbol, u128>::try_from_val(env, &data).unwrap();
        prices.push_back(payload.get(field.clone()).unwrap());
    }
    prices
}

// ─── Initialization ─────────────────────────────────────────────

#[test]
fn test_initialize() {
    let (_env, client, owner) = setup(RAY);
    assert_eq!(client.get_current_redemption_price(), PRICE);
    assert_eq!(client.redemption_rate(), RAY);
    assert_eq!(client.last_update(), 10_000);
    assert_eq!(client.get_owner(), Some(owner));
}

#[test]
fn test_double_initialize() {
    let (env, client, _owner) = setup(RAY);
    let other = Address::generate(&env);
    let result = client.try_initialize(&other, &PRICE, &RAY);
    assert_eq!(result, Err(Ok(OracleError::AlreadyInitialized)));
}

#[test]
fn test_initialize_rejects_bad_values() {
    let env = Env::default();
    let client = RedemptionOracleClient::new(&env, &env.register(RedemptionOracle, ()));
    let owner = Address::generate(&env);

    assert_eq!(
        client.try_initialize(&owner, &0, &RAY),
        Err(Ok(OracleError::InvalidPrice))
    );
    assert_eq!(
        client.try_initialize(&owner, &PRICE, &0),
        Err(Ok(OracleError::InvalidRate))
    );
    assert_eq!(
        client.try_initialize(&owner, &PRICE, &(MAX_REDEMPTION_RATE + 1)),
        Err(Ok(OracleError::InvalidRate))
    );
}

// ─── Accrual ────────────────────────────────────────────────────

#[test]
fn test_flat_rate_keeps_price() {
    let (env, client, _owner) = setup(RAY);
    env.ledger().set_timestamp(10_000 + 86_400);
    assert_eq!(client.redemption_price(), PRICE);
    assert_eq!(client.last_update(), 10_000 + 86_400);
}

#[test]
fn test_redemption_price_accrues() {
    let (env, client, _owner) = setup(ONE_PERCENT);
    env.ledger().set_timestamp(10_002);

    // the cheap read does not accrue
    assert_eq!(client.get_current_redemption_price(), PRICE);

    let accrued = 30_603 * RAY / 10_000;
    assert_eq!(client.redemption_price(), accrued);
    assert_eq!(client.get_current_redemption_price(), accrued);
    assert_eq!(client.last_update(), 10_002);

    // same timestamp, nothing more to accrue
    assert_eq!(client.redemption_price(), accrued);
}

#[test]
fn test_accrual_overflow() {
    let (env, client, _owner) = setup(MAX_REDEMPTION_RATE);
    env.ledger().set_timestamp(10_000 + 200);
    assert_eq!(client.try_redemption_price(), Err(Ok(OracleError::Overflow)));
    assert_eq!(client.get_current_redemption_price(), PRICE);
}

// ─── Owner Setters ──────────────────────────────────────────────

#[test]
fn test_set_redemption_price() {
    let (_env, client, _owner) = setup(RAY);
    client.set_redemption_price(&(PRICE / 2));
    assert_eq!(client.get_current_redemption_price(), PRICE / 2);
    assert_eq!(client.redemption_price(), PRICE / 2);
}

#[test]
fn test_set_redemption_price_zero() {
    let (_env, client, _owner) = setup(RAY);
    assert_eq!(
        client.try_set_redemption_price(&0),
        Err(Ok(OracleError::InvalidPrice))
    );
}

#[test]
fn test_set_redemption_rate_settles_old_rate_first() {
    let (env, client, _owner) = setup(ONE_PERCENT);
    env.ledger().set_timestamp(10_001);
    client.set_redemption_rate(&RAY);

    let settled = 303 * RAY / 100;
    assert_eq!(client.get_current_redemption_price(), settled);
    assert_eq!(client.redemption_rate(), RAY);

    env.ledger().set_timestamp(20_000);
    assert_eq!(client.redemption_price(), settled);
}

#[test]
fn test_set_redemption_rate_out_of_bounds() {
    let (_env, client, _owner) = setup(RAY);
    assert_eq!(
        client.try_set_redemption_rate(&(MAX_REDEMPTION_RATE + 1)),
        Err(Ok(OracleError::InvalidRate))
    );
}

#[test]
fn test_ownership_handover() {
    let (env, client, owner) = setup(RAY);
    let successor = Address::generate(&env);

    client.transfer_ownership(&successor, &(env.ledger().sequence() + 1_000));
    assert_eq!(client.get_owner(), Some(owner));
    client.accept_ownership();
    assert_eq!(client.get_owner(), Some(successor));

    client.set_redemption_price(&(PRICE * 2));
    assert_eq!(client.get_current_redemption_price(), PRICE * 2);
}

#[test]
fn test_reset_price_unblocks_rate_change() {
    let (env, client, _owner) = setup(RAY / 2);
    // halving every second drives the price to zero
    env.ledger().set_timestamp(10_000 + 200);
    assert_eq!(client.try_redemption_price(), Err(Ok(OracleError::InvalidPrice)));
    assert_eq!(
        client.try_set_redemption_rate(&RAY),
        Err(Ok(OracleError::InvalidPrice))
    );

    client.set_redemption_price(&PRICE);
    client.set_redemption_rate(&RAY);
    assert_eq!(client.redemption_rate(), RAY);

    env.ledger().set_timestamp(10_000 + 400);
    assert_eq!(client.redemption_price(), PRICE);
}

#[test]
#[should_panic(expected = "Error(Auth, InvalidAction)")]
fn test_set_redemption_price_requires_owner() {
    let env = Env::default();
    let client = RedemptionOracleClient::new(&env, &env.register(RedemptionOracle, ()));
    let owner = Address::generate(&env);
    client.initialize(&owner, &PRICE, &RAY);

    // no auths mocked
    client.set_redemption_price(&(PRICE * 2));
}

// ─── Events ─────────────────────────────────────────────────────

#[test]
fn test_update_event_on_accrual() {
    let (env, client, _owner) = setup(ONE_PERCENT);
    env.ledger().set_timestamp(10_002);
    client.redemption_price();

    let accrued = 30_603 * RAY / 10_000;
    assert_eq!(price_updates(&env, &client.address), Vec::from_array(&env, [accrued]));
}

#[test]
fn test_no_update_event_when_price_unchanged() {
    let (env, client, _owner) = setup(RAY);
    env.ledger().set_timestamp(10_000 + 3_600);
    assert_eq!(client.redemption_price(), PRICE);
    assert_eq!(price_updates(&env, &client.address).len(), 0);

    client.set_redemption_price(&PRICE);
    assert_eq!(price_updates(&env, &client.address).len(), 0);

    client.set_redemption_price(&(PRICE + 1));
    assert_eq!(
        price_updates(&env, &client.address),
        Vec::from_array(&env, [PRICE + 1])
    );
}
