//! # Events
//!
//! NEP-297 events, logged as `EVENT_JSON:{"standard":"crowdfund",...}`.
//!
//! A log line only survives when the receipt that wrote it succeeds, so a
//! failed call leaves no events behind. The indexer reads these lines back out
//! of receipt outcomes.

use near_sdk::{near, AccountId, NearToken};

use crate::types::ContributionStatus;

#[near(event_json(standard = "crowdfund"))]
pub enum CrowdfundEvent {
    // Proposal
    #[event_version("1.0.0")]
    ProposalInitialized { factory: AccountId },
    #[event_version("1.0.0")]
    ProposalConfigured {
        author: AccountId,
        goal: NearToken,
        min_deposit: NearToken,
    },
    #[event_version("1.0.0")]
    SupporterAdded {
        account: AccountId,
        amount: NearToken,
        total: NearToken,
    },
    #[event_version("1.0.0")]
    ProposalFunded { total: NearToken },
    #[event_version("1.0.0")]
    ConversionRequested {
        factory: AccountId,
        attempt: u32,
        amount: NearToken,
    },
    #[event_version("1.0.0")]
    ConversionConfirmed { attempt: u32, project: AccountId },
    #[event_version("1.0.0")]
    ConversionFailed { attempt: u32 },

    // Project
    #[event_version("1.0.0")]
    ProjectInitialized {
        factory: AccountId,
        proposal: AccountId,
    },
    #[event_version("1.0.0")]
    ProjectConfigured { owner: AccountId, budget: NearToken },
    #[event_version("1.0.0")]
    FundsAdded {
        account: AccountId,
        amount: NearToken,
        total: NearToken,
    },
    #[event_version("1.0.0")]
    ContributorSet {
        account: AccountId,
        status: ContributionStatus,
    },
    #[event_version("1.0.0")]
    ExpenseAdded {
        label: String,
        amount: NearToken,
        spent: NearToken,
    },

    // Factory
    #[event_version("1.0.0")]
    ProposalRegistered {
        proposal: AccountId,
        creator: AccountId,
    },
    #[event_version("1.0.0")]
    ProjectCreated {
        proposal: AccountId,
        project: AccountId,
        amount: NearToken,
    },
}
