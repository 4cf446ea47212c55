//! # Types
//!
//! Records owned by the Proposal and Project ledgers.
//!
//! ## Design decisions
//!
//! ### Root record / collection split
//!
//! Each ledger keeps one small root record ([`Proposal`], [`Project`]) and
//! pushes anything that grows per call (supporters, expenses, contributors)
//! into `near_sdk::store` collections. A pledge rewrites the root record plus
//! one appended entry, never the whole supporter list.
//!
//! ### Lifecycles
//!
//! ```text
//! Proposal: Initialized ──► Configured ──► Open ──► FullyFunded
//!                                                     │
//!                     Conversion: NotRequested ──► Requested ──► Converted
//!                                                     ▲   └──► Failed ─┐
//!                                                     └── retry ───────┘
//!
//! Project:  Initialized ──► Configured ──► Active
//! ```
//!
//! ### Amounts
//!
//! Every amount is a [`NearToken`]. On JSON surfaces it is a decimal string of
//! yoctoNEAR, because JSON numbers cannot carry a `u128`.

use near_sdk::{near, AccountId, NearToken};

use crate::{Error, Result, MIN_ACCOUNT_BALANCE};

const ZERO: NearToken = NearToken::from_yoctonear(0);

// ── Proposal ─────────────────────────────────────────────────────────

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalDetails {
    pub title: String,
    pub description: String,
    /// Signer of the `configure` call.
    pub author: AccountId,
}

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalFunding {
    pub goal: NearToken,
    pub min_deposit: NearToken,
    /// Sum of every accepted pledge.
    pub total: NearToken,
    /// Cached `total >= goal`.
    pub funded: bool,
}

impl ProposalFunding {
    /// Fresh terms with nothing pledged. Rejects a goal below the project
    /// reserve and a minimum deposit that is zero or above the goal.
    pub fn new(goal: NearToken, min_deposit: NearToken) -> Result<Self> {
        let funding = Self {
            goal,
            min_deposit,
            total: ZERO,
            funded: false,
        };
        funding.validate_terms()?;
        Ok(funding)
    }

    pub fn validate_terms(&self) -> Result<()> {
        if self.goal < MIN_ACCOUNT_BALANCE
            || self.min_deposit.is_zero()
            || self.min_deposit > self.goal
        {
            return Err(Error::InvalidFundingTerms);
        }
        Ok(())
    }

    pub fn is_goal_met(&self) -> bool {
        self.total >= self.goal
    }
}

/// One accepted pledge. Repeat pledges from the same account are separate entries.
#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Supporter {
    pub account: AccountId,
    pub amount: NearToken,
}

/// Progress of the Proposal → Project hand-off.
///
/// `Requested` is written in the same receipt that dispatches the request to
/// the factory, so a funded proposal always records that it asked.
/// `Failed` is where manual retry (and any future fund-return path) starts.
#[near(serializers = [borsh, json])]
#[serde(tag = "state", rename_all = "snake_case")]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Conversion {
    #[default]
    NotRequested,
    Requested {
        attempt: u32,
        amount: NearToken,
    },
    Converted {
        attempt: u32,
        project: AccountId,
    },
    Failed {
        attempt: u32,
    },
}

impl Conversion {
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::NotRequested => None,
            Self::Requested { attempt, .. }
            | Self::Converted { attempt, .. }
            | Self::Failed { attempt } => Some(*attempt),
        }
    }

    /// Attempt number for the next request: one past the last, starting at 1.
    pub fn next_attempt(&self) -> Result<u32> {
        match self.attempt() {
            None => Ok(1),
            Some(attempt) => attempt.checked_add(1).ok_or(Error::ArithmeticOverflow),
        }
    }
}

#[near(serializers = [json])]
#[serde(rename_all = "snake_case")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalStage {
    Initialized,
    Configured,
    /// Configured and holding at least one pledge.
    Open,
    FullyFunded,
}

/// Root record of a Proposal account.
#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub factory_id: AccountId,
    pub details: Option<ProposalDetails>,
    pub funding: Option<ProposalFunding>,
    #[serde(default)]
    pub conversion: Conversion,
}

impl Proposal {
    pub fn new(factory_id: AccountId) -> Self {
        Self {
            factory_id,
            details: None,
            funding: None,
            conversion: Conversion::NotRequested,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.details.is_some() && self.funding.is_some()
    }

    pub fn funding(&self) -> Result<&ProposalFunding> {
        self.funding.as_ref().ok_or(Error::NotConfigured)
    }

    pub fn stage(&self) -> ProposalStage {
        match &self.funding {
            None => ProposalStage::Initialized,
            Some(f) if f.funded => ProposalStage::FullyFunded,
            // Every accepted pledge is at least `min_deposit`, which is nonzero.
            Some(f) if !f.total.is_zero() => ProposalStage::Open,
            Some(_) => ProposalStage::Configured,
        }
    }

    /// Check `next` as an administrative replacement for this record and
    /// return it with `funded` recomputed.
    ///
    /// The pledged total, the factory and the conversion state belong to the
    /// ledger and cannot be rewritten. A resave may not flip `funded` either
    /// way, and once a conversion has been requested the funding terms are
    /// frozen as well.
    pub fn resave(&self, mut next: Proposal) -> Result<Proposal> {
        if next.factory_id != self.factory_id || next.conversion != self.conversion {
            return Err(Error::ConfigurationLocked);
        }
        if self.is_configured() && !next.is_configured() {
            return Err(Error::ConfigurationLocked);
        }

        let (total, funded) = self
            .funding
            .as_ref()
            .map_or((ZERO, false), |f| (f.total, f.funded));
        if let Some(funding) = next.funding.as_mut() {
            funding.funded = funding.is_goal_met();
            if funding.total != total || funding.funded != funded {
                return Err(Error::ConfigurationLocked);
            }
        }

        if next.funding != self.funding {
            if self.conversion != Conversion::NotRequested {
                return Err(Error::ConfigurationLocked);
            }
            if let Some(funding) = &next.funding {
                funding.validate_terms()?;
            }
        }
        Ok(next)
    }
}

// ── Project ──────────────────────────────────────────────────────────

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectDetails {
    pub title: String,
    pub description: String,
    /// Signer of the `configure` call.
    pub owner: AccountId,
}

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectFunding {
    pub total: NearToken,
    /// Sum of every recorded expense.
    pub spent: NearToken,
}

impl ProjectFunding {
    /// `total - spent`, or `None` once the project is overdrawn.
    pub fn remaining(&self) -> Option<NearToken> {
        self.total.checked_sub(self.spent)
    }
}

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub label: String,
    pub amount: NearToken,
}

/// Plain four-state status. No flag combinations are implied.
#[near(serializers = [borsh, json])]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContributionStatus {
    Blocked,
    Assigned,
    InProgress,
    Completed,
}

#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub account: AccountId,
    pub task: String,
    pub amount: NearToken,
    pub status: ContributionStatus,
}

#[near(serializers = [json])]
#[serde(rename_all = "snake_case")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectStage {
    Initialized,
    Configured,
    /// Configured and carrying at least one expense or contributor.
    Active,
}

/// Root record of a Project account.
#[near(serializers = [borsh, json])]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub factory_id: AccountId,
    /// Back-reference only; a project never calls into its proposal.
    pub proposal_id: AccountId,
    pub details: Option<ProjectDetails>,
    pub funding: Option<ProjectFunding>,
}

impl Project {
    pub fn new(factory_id: AccountId, proposal_id: AccountId) -> Self {
        Self {
            factory_id,
            proposal_id,
            details: None,
            funding: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.details.is_some() && self.funding.is_some()
    }

    pub fn funding(&self) -> Result<&ProjectFunding> {
        self.funding.as_ref().ok_or(Error::NotConfigured)
    }
}
