//! # Project
//!
//! Tracks contributors and spend against the budget transferred in at
//! creation.
//!
//! | Key            | Type                                   |
//! |----------------|----------------------------------------|
//! | `STATE`        | [`VersionedProject`]                   |
//! | `Expenses`     | `Vector<Expense>`                      |
//! | `Contributors` | `IterableMap<AccountId, Contribution>` |

use crowdfund_common::{
    Contribution, CrowdfundEvent, Error, Expense, Project, ProjectDetails, ProjectFunding,
    ProjectStage, StorageKey, VersionedProject, MIN_ACCOUNT_BALANCE,
};
use near_sdk::json_types::U128;
use near_sdk::store::{IterableMap, Vector};
use near_sdk::{env, log, near, AccountId, NearToken};

#[cfg(test)]
mod test_project;
#[cfg(test)]
mod testutils;

#[near(contract_state)]
pub struct ProjectContract {
    record: Option<VersionedProject>,
    expenses: Vector<Expense>,
    contributors: IterableMap<AccountId, Contribution>,
}

impl Default for ProjectContract {
    fn default() -> Self {
        Self {
            record: None,
            expenses: Vector::new(StorageKey::Expenses),
            contributors: IterableMap::new(StorageKey::Contributors),
        }
    }
}

#[near]
impl ProjectContract {
    // ─────────────────────────────────────────────────────────
    // Mutators
    // ─────────────────────────────────────────────────────────

    /// Create the record. The predecessor becomes `factory_id`.
    #[payable]
    #[handle_result]
    pub fn initialize(&mut self, proposal_id: AccountId) -> Result<(), Error> {
        if self.record.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        if env::attached_deposit() < MIN_ACCOUNT_BALANCE {
            return Err(Error::InsufficientStake);
        }
        let record = Project::new(env::predecessor_account_id(), proposal_id);
        CrowdfundEvent::ProjectInitialized {
            factory: record.factory_id.clone(),
            proposal: record.proposal_id.clone(),
        }
        .emit();
        self.save(record);
        Ok(())
    }

    /// Set details and seed the budget from whatever the account holds above
    /// its reserve. One-shot.
    #[handle_result]
    pub fn configure(&mut self, title: String, description: String) -> Result<(), Error> {
        let mut record = self.load()?;
        if record.details.is_some() {
            return Err(Error::ConfigurationLocked);
        }
        let owner = env::signer_account_id();
        let budget = env::account_balance().saturating_sub(MIN_ACCOUNT_BALANCE);
        record.details = Some(ProjectDetails {
            title,
            description,
            owner: owner.clone(),
        });
        record.funding = Some(ProjectFunding {
            total: budget,
            spent: NearToken::from_yoctonear(0),
        });
        self.save(record);

        log!("project configured with budget {budget}");
        CrowdfundEvent::ProjectConfigured { owner, budget }.emit();
        Ok(())
    }

    /// Add the attached deposit to the budget.
    #[payable]
    #[handle_result]
    pub fn add_funds(&mut self) -> Result<(), Error> {
        let mut record = self.load()?;
        let amount = env::attached_deposit();
        let funding = record.funding.as_mut().ok_or(Error::NotConfigured)?;
        funding.total = funding
            .total
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        let total = funding.total;
        self.save(record);

        CrowdfundEvent::FundsAdded {
            account: env::signer_account_id(),
            amount,
            total,
        }
        .emit();
        Ok(())
    }

    /// Upsert `contribution` under `account`. The key wins over
    /// `contribution.account`; no status transition is validated.
    #[handle_result]
    pub fn add_contributor(
        &mut self,
        account: AccountId,
        mut contribution: Contribution,
    ) -> Result<(), Error> {
        self.load()?.funding()?;
        contribution.account = account.clone();
        let status = contribution.status;
        self.contributors.insert(account.clone(), contribution);
        CrowdfundEvent::ContributorSet { account, status }.emit();
        Ok(())
    }

    /// Append an expense. Spending past the budget needs `allow_overspend`.
    #[handle_result]
    pub fn add_expense(
        &mut self,
        label: String,
        amount: U128,
        allow_overspend: Option<bool>,
    ) -> Result<(), Error> {
        let mut record = self.load()?;
        let amount = NearToken::from_yoctonear(amount.0);
        let funding = record.funding.as_mut().ok_or(Error::NotConfigured)?;
        let spent = funding
            .spent
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        if spent > funding.total && !allow_overspend.unwrap_or(false) {
            return Err(Error::ExceedsBudget);
        }
        funding.spent = spent;

        self.expenses.push(Expense {
            label: label.clone(),
            amount,
        });
        self.save(record);
        CrowdfundEvent::ExpenseAdded {
            label,
            amount,
            spent,
        }
        .emit();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    #[handle_result]
    pub fn get_project(&self) -> Result<Project, Error> {
        self.load()
    }

    #[handle_result]
    pub fn get_factory(&self) -> Result<AccountId, Error> {
        Ok(self.load()?.factory_id)
    }

    #[handle_result]
    pub fn get_proposal(&self) -> Result<AccountId, Error> {
        Ok(self.load()?.proposal_id)
    }

    /// `total - spent`; fails with `BudgetOverdrawn` rather than going negative.
    #[handle_result]
    pub fn get_remaining_budget(&self) -> Result<U128, Error> {
        let remaining = self
            .load()?
            .funding()?
            .remaining()
            .ok_or(Error::BudgetOverdrawn)?;
        Ok(U128(remaining.as_yoctonear()))
    }

    #[handle_result]
    pub fn get_expenses(&self) -> Result<Vec<Expense>, Error> {
        self.load()?.funding()?;
        Ok(self.expenses.iter().cloned().collect())
    }

    /// Contributions in the order their accounts were first added.
    #[handle_result]
    pub fn get_contributors(&self) -> Result<Vec<Contribution>, Error> {
        self.load()?.funding()?;
        Ok(self.contributors.values().cloned().collect())
    }

    #[handle_result]
    pub fn get_contribution(&self, account: AccountId) -> Result<Option<Contribution>, Error> {
        self.load()?.funding()?;
        Ok(self.contributors.get(&account).cloned())
    }

    #[handle_result]
    pub fn is_configured(&self) -> Result<bool, Error> {
        Ok(self.load()?.is_configured())
    }

    #[handle_result]
    pub fn get_stage(&self) -> Result<ProjectStage, Error> {
        let record = self.load()?;
        if !record.is_configured() {
            return Ok(ProjectStage::Initialized);
        }
        Ok(if self.expenses.is_empty() && self.contributors.is_empty() {
            ProjectStage::Configured
        } else {
            ProjectStage::Active
        })
    }
}

impl ProjectContract {
    fn load(&self) -> Result<Project, Error> {
        self.record
            .clone()
            .map(Project::from)
            .ok_or(Error::NotInitialized)
    }

    fn save(&mut self, record: Project) {
        self.record = Some(record.into());
    }
}
