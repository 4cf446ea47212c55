//! Unit-test helpers shared by the contract crates.

use near_sdk::serde_json::{self, Value};
use near_sdk::test_utils::{get_logs, VMContextBuilder};
use near_sdk::{AccountId, NearToken};

/// Parse a literal account id.
pub fn account(id: &str) -> AccountId {
    id.parse().unwrap()
}

/// Whole NEAR to [`NearToken`].
pub fn near(amount: u128) -> NearToken {
    NearToken::from_near(amount)
}

/// A context executing on `current`, called and signed by `caller`.
pub fn context(current: &str, caller: &str) -> VMContextBuilder {
    let mut builder = VMContextBuilder::new();
    builder
        .current_account_id(account(current))
        .predecessor_account_id(account(caller))
        .signer_account_id(account(caller));
    builder
}

/// Every NEP-297 event logged so far in the current context, decoded.
pub fn emitted() -> Vec<Value> {
    get_logs()
        .iter()
        .filter_map(|line| line.strip_prefix("EVENT_JSON:"))
        .map(|json| serde_json::from_str(json).unwrap())
        .collect()
}

/// Names of the events logged so far, in order.
pub fn emitted_names() -> Vec<String> {
    emitted()
        .iter()
        .map(|event| event["event"].as_str().unwrap().to_string())
        .collect()
}
