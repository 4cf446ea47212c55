//! Cross-contract interfaces.
//!
//! Only the calls one crowdfund contract makes on another are declared here.
//! The factory sets up new accounts with batched `function_call` actions
//! instead, because those calls have to share a receipt with `create_account`.

use near_sdk::{ext_contract, AccountId};

use crate::types::ProposalDetails;

/// The factory as seen by a proposal asking for its conversion.
///
/// Resolves to the new project's id, or `None` when creation failed after the
/// request was accepted.
#[ext_contract(ext_factory)]
pub trait CrowdfundFactory {
    fn create_project(&mut self, details: ProposalDetails) -> Option<AccountId>;
}
