//! Key scheme of the single table
//!
//! | Entity                 | pk                  | sk                          |
//! |------------------------|---------------------|-----------------------------|
//! | Fund                   | `FUND#<fundId>`     | `FUND#<fundId>`             |
//! | Client                 | `CLIENT#<clientId>` | `CLIENT#<clientId>`         |
//! | ClientBalance          | `CLIENT#<clientId>` | `BALANCE`                   |
//! | Transaction            | `CLIENT#<clientId>` | `TRANSACTION#<transactionId>` |
//! | ClientFundSubscription | `CLIENT#<clientId>` | `SUBSCRIPTION#<fundId>`     |
//!
//! No other module builds or parses keys.

pub const FUND_PREFIX: &str = "FUND#";
pub const CLIENT_PREFIX: &str = "CLIENT#";
pub const BALANCE_SORT_KEY: &str = "BALANCE";
pub const TRANSACTION_PREFIX: &str = "TRANSACTION#";
pub const SUBSCRIPTION_PREFIX: &str = "SUBSCRIPTION#";

/// (pk, sk) of an item
pub type Key = (String, String);

pub fn fund_pk(fund_id: &str) -> String {
    format!("{}{}", FUND_PREFIX, fund_id)
}

pub fn client_pk(client_id: &str) -> String {
    format!("{}{}", CLIENT_PREFIX, client_id)
}

pub fn fund_key(fund_id: &str) -> Key {
    let key = fund_pk(fund_id);
    (key.clone(), key)
}

pub fn client_key(client_id: &str) -> Key {
    let key = client_pk(client_id);
    (key.clone(), key)
}

pub fn balance_key(client_id: &str) -> Key {
    (client_pk(client_id), BALANCE_SORT_KEY.to_string())
}

pub fn transaction_key(client_id: &str, transaction_id: &str) -> Key {
    (client_pk(client_id), format!("{}{}", TRANSACTION_PREFIX, transaction_id))
}

pub fn subscription_key(client_id: &str, fund_id: &str) -> Key {
    (client_pk(client_id), format!("{}{}", SUBSCRIPTION_PREFIX, fund_id))
}

/// Whether a scanned item is a fund
pub fn is_fund_item(pk: &str, sk: &str) -> bool {
    pk.starts_with(FUND_PREFIX) && sk.starts_with(FUND_PREFIX)
}

/// Whether a scanned item is a client profile (not one of its balance,
/// transaction or subscription items)
pub fn is_client_profile_item(pk: &str, sk: &str) -> bool {
    pk.starts_with(CLIENT_PREFIX) && sk.starts_with(CLIENT_PREFIX)
}
