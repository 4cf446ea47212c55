//! # Storage
//!
//! Each contract keeps its root record under the SDK's `STATE` key and every
//! growing collection under its own one-byte prefix:
//!
//! | Prefix               | Owner    | Collection                              |
//! |----------------------|----------|-----------------------------------------|
//! | `Supporters`         | Proposal | `Vector<Supporter>`, pledge order       |
//! | `Expenses`           | Project  | `Vector<Expense>`, append-only          |
//! | `Contributors`       | Project  | `IterableMap<AccountId, Contribution>`  |
//! | `Registry`           | Factory  | `IterableSet<AccountId>`, provenance    |
//! | `Conversions`        | Factory  | `IterableMap<AccountId, AccountId>`     |
//! | `PendingConversions` | Factory  | `LookupMap<AccountId, AccountId>`       |
//! | `ProposalCode`       | Factory  | `LazyOption<Vec<u8>>`                   |
//! | `ProjectCode`        | Factory  | `LazyOption<Vec<u8>>`                   |
//!
//! Prefixes are scoped to one account, so the shared enum never mixes state
//! between contracts.
//!
//! ## Versioned roots
//!
//! Root records are stored as [`VersionedProposal`] / [`VersionedProject`].
//! A new layout adds a variant and a migration arm in `From`, and old state
//! keeps decoding.

use near_sdk::{near, BorshStorageKey};

use crate::types::{Project, Proposal};

#[near(serializers = [borsh])]
#[derive(BorshStorageKey)]
pub enum StorageKey {
    Supporters,
    Expenses,
    Contributors,
    Registry,
    Conversions,
    PendingConversions,
    ProposalCode,
    ProjectCode,
}

#[near(serializers = [borsh])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionedProposal {
    V1(Proposal),
}

impl From<Proposal> for VersionedProposal {
    fn from(proposal: Proposal) -> Self {
        Self::V1(proposal)
    }
}

impl From<VersionedProposal> for Proposal {
    fn from(versioned: VersionedProposal) -> Self {
        match versioned {
            VersionedProposal::V1(proposal) => proposal,
        }
    }
}

#[near(serializers = [borsh])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionedProject {
    V1(Project),
}

impl From<Project> for VersionedProject {
    fn from(project: Project) -> Self {
        Self::V1(project)
    }
}

impl From<VersionedProject> for Project {
    fn from(versioned: VersionedProject) -> Self {
        match versioned {
            VersionedProject::V1(project) => project,
        }
    }
}
