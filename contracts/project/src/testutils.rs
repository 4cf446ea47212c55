//! Shared fixtures for the project tests.

use crowdfund_common::testing::{account, context, near};
use crowdfund_common::{Contribution, ContributionStatus};
use near_sdk::{testing_env, NearToken};

use crate::ProjectContract;

pub const PROJECT: &str = "project-0.crowdfund";
pub const FACTORY: &str = "crowdfund";
pub const PROPOSAL: &str = "proposal-0.crowdfund";

/// Start a new call on the project account while it holds `balance`.
pub fn call(caller: &str, deposit: NearToken, balance: NearToken) {
    testing_env!(context(PROJECT, caller)
        .attached_deposit(deposit)
        .account_balance(balance)
        .build());
}

/// A project initialized by [`FACTORY`] with the bare stake.
pub fn initialized() -> ProjectContract {
    call(FACTORY, near(3), near(3));
    let mut contract = ProjectContract::default();
    contract.initialize(account(PROPOSAL)).unwrap();
    contract
}

/// Initialized and configured by `alice` while the account holds only its
/// stake, so the budget is zero.
pub fn configured() -> ProjectContract {
    let mut contract = initialized();
    call("alice", near(0), near(3));
    contract
        .configure("t".to_string(), "d".to_string())
        .unwrap();
    contract
}

pub fn contribution(task: &str, amount: u128, status: ContributionStatus) -> Contribution {
    Contribution {
        account: account("nobody"),
        task: task.to_string(),
        amount: near(amount),
        status,
    }
}
