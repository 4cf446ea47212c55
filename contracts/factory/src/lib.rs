//! # Factory
//!
//! Creates proposal and project accounts, and is the single place that
//! authorizes a Proposal → Project conversion.
//!
//! | Key                  | Type                               | Description                        |
//! |----------------------|------------------------------------|------------------------------------|
//! | `STATE`              | [`FactoryContract`]                | Creation counters                  |
//! | `Registry`           | `IterableSet<AccountId>`           | Provenance set, registration order |
//! | `Conversions`        | `IterableMap<AccountId, AccountId>`| Project created for each proposal  |
//! | `PendingConversions` | `LookupMap<AccountId, AccountId>`  | Project creations still in flight  |
//! | `ProposalCode`       | `LazyOption<Vec<u8>>`              | Wasm deployed on new proposals     |
//! | `ProjectCode`        | `LazyOption<Vec<u8>>`              | Wasm deployed on new projects      |
//!
//! Every creation is one batch on the new sub-account (create, fund, deploy,
//! set up) followed by a callback here. The registry and conversion map are
//! only written by the callback once the batch has succeeded; a failed batch
//! refunds the deposit to whoever paid it. Sub-accounts are named
//! `proposal-{n}.{factory}` and `project-{n}.{factory}` from counters that
//! only grow.

use crowdfund_common::{
    CrowdfundEvent, Error, ProposalDetails, StorageKey, MIN_ACCOUNT_BALANCE, ON_CREATED_GAS,
    SETUP_CALL_GAS,
};
use near_sdk::json_types::Base64VecU8;
use near_sdk::serde_json::json;
use near_sdk::store::{IterableMap, IterableSet, LazyOption, LookupMap};
use near_sdk::{env, log, near, AccountId, NearToken, PanicOnDefault, Promise, PromiseResult};


/// Which contract a stored code blob is deployed as.
#[near(serializers = [json])]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Proposal,
    Project,
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct FactoryContract {
    proposal_count: u64,
    project_count: u64,
    registry: IterableSet<AccountId>,
    conversions: IterableMap<AccountId, AccountId>,
    pending: LookupMap<AccountId, AccountId>,
    proposal_code: LazyOption<Vec<u8>>,
    project_code: LazyOption<Vec<u8>>,
}

#[near]
impl FactoryContract {
    #[init]
    pub fn new() -> Self {
        Self {
            proposal_count: 0,
            project_count: 0,
            registry: IterableSet::new(StorageKey::Registry),
            conversions: IterableMap::new(StorageKey::Conversions),
            pending: LookupMap::new(StorageKey::PendingConversions),
            proposal_code: LazyOption::new(StorageKey::ProposalCode, None),
            project_code: LazyOption::new(StorageKey::ProjectCode, None),
        }
    }

    /// Replace the wasm deployed on new accounts of `kind`.
    #[private]
    pub fn store_code(&mut self, kind: CodeKind, code: Base64VecU8) {
        log!("storing {} bytes of {kind:?} code", code.0.len());
        match kind {
            CodeKind::Proposal => self.proposal_code.set(Some(code.into())),
            CodeKind::Project => self.project_code.set(Some(code.into())),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────

    /// Create and initialize a new proposal account. The attached deposit
    /// becomes its stake; the proposal is registered once the batch lands.
    #[payable]
    #[handle_result]
    pub fn create_proposal(&mut self) -> Result<Promise, Error> {
        let stake = env::attached_deposit();
        if stake < MIN_ACCOUNT_BALANCE {
            return Err(Error::InsufficientStake);
        }
        let code = self
            .proposal_code
            .get()
            .clone()
            .ok_or(Error::CodeNotStored("proposal"))?;
        let proposal = sub_account("proposal", self.proposal_count)?;
        self.proposal_count = self
            .proposal_count
            .checked_add(1)
            .ok_or(Error::ArithmeticOverflow)?;

        let creator = env::predecessor_account_id();
        Ok(Promise::new(proposal.clone())
            .create_account()
            .deploy_contract(code)
            .function_call("initialize".to_string(), b"{}".to_vec(), stake, SETUP_CALL_GAS)
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(ON_CREATED_GAS)
                    .on_proposal_created(proposal, creator, stake),
            ))
    }

    /// Materialize the project for the calling proposal, funded with the
    /// attached deposit less the project's reserve.
    ///
    /// The predecessor must be in the provenance set; nothing about `details`
    /// can substitute for that. Resolves to the new project account, or
    /// `None` when creation failed and the deposit was refunded.
    #[payable]
    #[handle_result]
    pub fn create_project(&mut self, details: ProposalDetails) -> Result<Promise, Error> {
        let proposal = env::predecessor_account_id();
        if !self.registry.contains(&proposal) {
            return Err(Error::UnknownProposal);
        }
        if self.conversions.contains_key(&proposal) || self.pending.contains_key(&proposal) {
            return Err(Error::AlreadyConverted);
        }
        let amount = env::attached_deposit();
        let budget = amount
            .checked_sub(MIN_ACCOUNT_BALANCE)
            .ok_or(Error::InsufficientStake)?;
        let code = self
            .project_code
            .get()
            .clone()
            .ok_or(Error::CodeNotStored("project"))?;
        let project = sub_account("project", self.project_count)?;
        self.project_count = self
            .project_count
            .checked_add(1)
            .ok_or(Error::ArithmeticOverflow)?;
        self.pending.insert(proposal.clone(), project.clone());

        let initialize = json!({ "proposal_id": proposal }).to_string().into_bytes();
        let configure = json!({
            "title": details.title,
            "description": details.description,
        })
        .to_string()
        .into_bytes();

        Ok(Promise::new(project.clone())
            .create_account()
            .transfer(budget)
            .deploy_contract(code)
            .function_call("initialize".to_string(), initialize, MIN_ACCOUNT_BALANCE, SETUP_CALL_GAS)
            .function_call(
                "configure".to_string(),
                configure,
                NearToken::from_yoctonear(0),
                SETUP_CALL_GAS,
            )
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(ON_CREATED_GAS)
                    .on_project_created(proposal, project, amount),
            ))
    }

    #[private]
    pub fn on_proposal_created(
        &mut self,
        proposal: AccountId,
        creator: AccountId,
        stake: NearToken,
    ) -> Option<AccountId> {
        self.settle_proposal(proposal, creator, stake, batch_succeeded())
    }

    #[private]
    pub fn on_project_created(
        &mut self,
        proposal: AccountId,
        project: AccountId,
        amount: NearToken,
    ) -> Option<AccountId> {
        self.settle_project(proposal, project, amount, batch_succeeded())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Registered proposals, oldest first.
    pub fn list_proposals(&self) -> Vec<AccountId> {
        self.registry.iter().cloned().collect()
    }

    pub fn is_registered(&self, account: AccountId) -> bool {
        self.registry.contains(&account)
    }

    pub fn get_project_for(&self, proposal: AccountId) -> Option<AccountId> {
        self.conversions.get(&proposal).cloned()
    }

    /// Created projects, in conversion order.
    pub fn list_projects(&self) -> Vec<AccountId> {
        self.conversions.values().cloned().collect()
    }
}

impl FactoryContract {
    fn settle_proposal(
        &mut self,
        proposal: AccountId,
        creator: AccountId,
        stake: NearToken,
        created: bool,
    ) -> Option<AccountId> {
        if !created {
            log!("proposal {proposal} was not created, refunding {stake} to {creator}");
            Promise::new(creator).transfer(stake);
            return None;
        }
        self.registry.insert(proposal.clone());
        CrowdfundEvent::ProposalRegistered {
            proposal: proposal.clone(),
            creator,
        }
        .emit();
        Some(proposal)
    }

    fn settle_project(
        &mut self,
        proposal: AccountId,
        project: AccountId,
        amount: NearToken,
        created: bool,
    ) -> Option<AccountId> {
        self.pending.remove(&proposal);
        if !created {
            log!("project {project} was not created, refunding {amount} to {proposal}");
            Promise::new(proposal).transfer(amount);
            return None;
        }
        self.conversions.insert(proposal.clone(), project.clone());
        CrowdfundEvent::ProjectCreated {
            proposal,
            project: project.clone(),
            amount,
        }
        .emit();
        Some(project)
    }
}

/// Outcome of the creation batch this callback is chained to.
fn batch_succeeded() -> bool {
    env::promise_results_count() == 1
        && matches!(env::promise_result(0), PromiseResult::Successful(_))
}

fn sub_account(prefix: &str, index: u64) -> Result<AccountId, Error> {
    let id = format!("{prefix}-{index}.{}", env::current_account_id());
    id.parse().map_err(|_| Error::InvalidAccountId(id))
}
