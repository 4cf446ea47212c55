//! # Crowdfund Common
//!
//! Everything the three crowdfund contracts agree on:
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`types`]      | Proposal and Project records, funding and conversion state |
//! | [`storage`]    | Collection prefixes and versioned root records             |
//! | [`errors`]     | The [`Error`] every entry point fails with                 |
//! | [`events`]     | NEP-297 events logged on each state change                 |
//! | [`interfaces`] | Cross-contract call interfaces                             |
//!
//! A proposal collects pledges until its goal is met, then asks the factory to
//! materialize a project funded with the pledged total. The factory only honours
//! requests from proposals it created itself.

pub mod errors;
pub mod events;
pub mod interfaces;
pub mod storage;
pub mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod testing;

use near_sdk::{Gas, NearToken};

pub use errors::Error;
pub use events::CrowdfundEvent;
pub use storage::{StorageKey, VersionedProject, VersionedProposal};
pub use types::{
    Contribution, ContributionStatus, Conversion, Expense, Project, ProjectDetails, ProjectFunding,
    ProjectStage, Proposal, ProposalDetails, ProposalFunding, ProposalStage, Supporter,
};

/// Stake every Proposal and Project account must receive on `initialize`.
/// Projects keep it as their reserve, so it is excluded from the budget.
pub const MIN_ACCOUNT_BALANCE: NearToken = NearToken::from_near(3);

/// Gas forwarded to the factory's `create_project`.
pub const CREATE_PROJECT_GAS: Gas = Gas::from_tgas(100);

/// Reserved for the proposal's completion callback.
pub const ON_PROJECT_CREATED_GAS: Gas = Gas::from_tgas(15);

/// Gas for each `initialize` / `configure` call the factory batches onto a new account.
pub const SETUP_CALL_GAS: Gas = Gas::from_tgas(10);

/// Reserved for the factory's own creation callbacks.
pub const ON_CREATED_GAS: Gas = Gas::from_tgas(15);

pub type Result<T> = std::result::Result<T, Error>;
