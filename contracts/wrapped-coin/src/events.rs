use soroban_sdk::{contractevent, Address};

/// Underlying deposited into custody and credited to `account`.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mint {
    #[topic]
    pub account: Address,
    pub amount: i128,
    pub underlying_amount: i128,
}

/// External balance burned and underlying released back to `account`.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Burn {
    #[topic]
    pub account: Address,
    pub amount: i128,
    pub underlying_amount: i128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    #[topic]
    pub from: Address,
    #[topic]
    pub to: Address,
    pub amount: i128,
    pub underlying_amount: i128,
}
