//! # Proposal
//!
//! Collects pledges toward a goal. The pledge that first brings `total` to the
//! goal also records the conversion intent and, in the same receipt, sends
//! `create_project` to the factory with the pledged total attached.
//! [`ProposalContract::on_project_created`] later settles the intent as
//! `Converted` or `Failed`.
//!
//! | Entry point          | Requires                         |
//! |----------------------|----------------------------------|
//! | `initialize`         | not initialized, stake ≥ 3 NEAR   |
//! | `configure`          | initialized, nothing pledged yet |
//! | `add_supporter`      | configured, not funded           |
//! | `on_project_created` | called by this account           |
//! | `retry_conversion`   | conversion failed                |
//! | `resave_proposal`    | called by the factory or itself  |
//!
//! ## Storage
//!
//! | Key          | Type                   |
//! |--------------|------------------------|
//! | `STATE`      | [`VersionedProposal`]  |
//! | `Supporters` | `Vector<Supporter>`    |

use crowdfund_common::interfaces::ext_factory;
use crowdfund_common::{
    Conversion, CrowdfundEvent, Error, Proposal, ProposalDetails, ProposalFunding, ProposalStage,
    StorageKey, Supporter, VersionedProposal, CREATE_PROJECT_GAS, MIN_ACCOUNT_BALANCE,
    ON_PROJECT_CREATED_GAS,
};
use near_sdk::json_types::U128;
use near_sdk::store::Vector;
use near_sdk::{env, log, near, AccountId, Gas, NearToken, PromiseError};

#[cfg(test)]
mod test_proposal;

/// Headroom for the rest of the pledging receipt after the request is queued.
const REQUEST_OVERHEAD_GAS: Gas = Gas::from_tgas(10);

/// Prepaid gas left over that a conversion request needs.
const CONVERSION_GAS: Gas = Gas::from_gas(
    CREATE_PROJECT_GAS.as_gas() + ON_PROJECT_CREATED_GAS.as_gas() + REQUEST_OVERHEAD_GAS.as_gas(),
);

#[near(contract_state)]
pub struct ProposalContract {
    record: Option<VersionedProposal>,
    supporters: Vector<Supporter>,
}

impl Default for ProposalContract {
    fn default() -> Self {
        Self {
            record: None,
            supporters: Vector::new(StorageKey::Supporters),
        }
    }
}

#[near]
impl ProposalContract {
    // ─────────────────────────────────────────────────────────
    // Mutators
    // ─────────────────────────────────────────────────────────

    /// Create the record. The predecessor becomes `factory_id`.
    #[payable]
    #[handle_result]
    pub fn initialize(&mut self) -> Result<(), Error> {
        if self.record.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        if env::attached_deposit() < MIN_ACCOUNT_BALANCE {
            return Err(Error::InsufficientStake);
        }
        let record = Proposal::new(env::predecessor_account_id());
        CrowdfundEvent::ProposalInitialized {
            factory: record.factory_id.clone(),
        }
        .emit();
        self.save(record);
        Ok(())
    }

    /// Set details and (re)set the funding terms. The signer becomes author.
    ///
    /// Allowed until the first pledge is accepted; afterwards the terms are
    /// locked. The goal must cover the project's reserve.
    #[handle_result]
    pub fn configure(
        &mut self,
        title: String,
        description: String,
        goal: U128,
        min_deposit: U128,
    ) -> Result<(), Error> {
        let mut record = self.load()?;
        if record.funding.as_ref().is_some_and(|f| !f.total.is_zero()) {
            return Err(Error::ConfigurationLocked);
        }
        let funding = ProposalFunding::new(
            NearToken::from_yoctonear(goal.0),
            NearToken::from_yoctonear(min_deposit.0),
        )?;

        let author = env::signer_account_id();
        CrowdfundEvent::ProposalConfigured {
            author: author.clone(),
            goal: funding.goal,
            min_deposit: funding.min_deposit,
        }
        .emit();
        record.details = Some(ProposalDetails {
            title,
            description,
            author,
        });
        record.funding = Some(funding);
        self.save(record);
        Ok(())
    }

    /// Record the attached deposit as a pledge from the signer.
    #[payable]
    #[handle_result]
    pub fn add_supporter(&mut self) -> Result<(), Error> {
        let mut record = self.load()?;
        let amount = env::attached_deposit();

        let funding = record.funding.as_mut().ok_or(Error::NotConfigured)?;
        if funding.funded {
            return Err(Error::AlreadyFunded);
        }
        if amount < funding.min_deposit {
            return Err(Error::DepositTooLow);
        }
        funding.total = funding
            .total
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        funding.funded = funding.is_goal_met();
        let (total, newly_funded) = (funding.total, funding.funded);
        if newly_funded {
            ensure_conversion_gas()?;
        }

        let account = env::signer_account_id();
        self.supporters.push(Supporter {
            account: account.clone(),
            amount,
        });
        CrowdfundEvent::SupporterAdded {
            account,
            amount,
            total,
        }
        .emit();

        if newly_funded {
            CrowdfundEvent::ProposalFunded { total }.emit();
            request_conversion(&mut record)?;
        }
        self.save(record);
        Ok(())
    }

    /// Completion handler for the factory's `create_project`.
    ///
    /// A result for any attempt other than the pending one is ignored.
    #[private]
    #[handle_result]
    pub fn on_project_created(
        &mut self,
        attempt: u32,
        #[callback_result] created: Result<Option<AccountId>, PromiseError>,
    ) -> Result<Conversion, Error> {
        let mut record = self.load()?;
        match &record.conversion {
            Conversion::Requested { attempt: pending, .. } if *pending == attempt => {}
            other => {
                log!("ignoring stale conversion callback for attempt {attempt}: {other:?}");
                return Ok(record.conversion);
            }
        }

        record.conversion = match created {
            Ok(Some(project)) => {
                CrowdfundEvent::ConversionConfirmed {
                    attempt,
                    project: project.clone(),
                }
                .emit();
                Conversion::Converted { attempt, project }
            }
            Ok(None) | Err(_) => {
                CrowdfundEvent::ConversionFailed { attempt }.emit();
                Conversion::Failed { attempt }
            }
        };
        let conversion = record.conversion.clone();
        self.save(record);
        Ok(conversion)
    }

    /// Re-send a failed conversion. Anyone may pay for the retry.
    ///
    /// A failed `create_project` refunds its deposit, so the retry carries the
    /// full pledged total again.
    #[handle_result]
    pub fn retry_conversion(&mut self) -> Result<(), Error> {
        let mut record = self.load()?;
        if !matches!(record.conversion, Conversion::Failed { .. }) {
            return Err(Error::ConversionNotFailed);
        }
        ensure_conversion_gas()?;
        request_conversion(&mut record)?;
        self.save(record);
        Ok(())
    }

    /// Overwrite the whole record. Restricted to the factory and the proposal
    /// account itself. See [`Proposal::resave`] for what may change.
    #[handle_result]
    pub fn resave_proposal(&mut self, record: Proposal) -> Result<(), Error> {
        let current = self.load()?;
        let caller = env::predecessor_account_id();
        if caller != current.factory_id && caller != env::current_account_id() {
            return Err(Error::NotAuthorized);
        }
        let record = current.resave(record)?;
        self.save(record);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    #[handle_result]
    pub fn get_proposal(&self) -> Result<Proposal, Error> {
        self.load()
    }

    #[handle_result]
    pub fn get_factory(&self) -> Result<AccountId, Error> {
        Ok(self.load()?.factory_id)
    }

    #[handle_result]
    pub fn get_funding_total(&self) -> Result<U128, Error> {
        Ok(U128(self.load()?.funding()?.total.as_yoctonear()))
    }

    /// Every accepted pledge, in the order it was made.
    #[handle_result]
    pub fn list_supporters(&self) -> Result<Vec<Supporter>, Error> {
        self.load()?.funding()?;
        Ok(self.supporters.iter().cloned().collect())
    }

    #[handle_result]
    pub fn is_configured(&self) -> Result<bool, Error> {
        Ok(self.load()?.is_configured())
    }

    #[handle_result]
    pub fn is_fully_funded(&self) -> Result<bool, Error> {
        Ok(self.load()?.funding()?.funded)
    }

    #[handle_result]
    pub fn get_conversion(&self) -> Result<Conversion, Error> {
        Ok(self.load()?.conversion)
    }

    #[handle_result]
    pub fn get_stage(&self) -> Result<ProposalStage, Error> {
        Ok(self.load()?.stage())
    }
}

impl ProposalContract {
    fn load(&self) -> Result<Proposal, Error> {
        self.record
            .clone()
            .map(Proposal::from)
            .ok_or(Error::NotInitialized)
    }

    fn save(&mut self, record: Proposal) {
        self.record = Some(record.into());
    }
}

/// The request and its callback are paid from this receipt's prepaid gas.
fn ensure_conversion_gas() -> Result<(), Error> {
    if env::prepaid_gas().saturating_sub(env::used_gas()) < CONVERSION_GAS {
        return Err(Error::GasExhausted);
    }
    Ok(())
}

/// Write `Requested` into `record` and send `create_project` with the pledged
/// total, chained to [`ProposalContract::on_project_created`].
fn request_conversion(record: &mut Proposal) -> Result<(), Error> {
    let details = record.details.clone().ok_or(Error::NotConfigured)?;
    let amount = record.funding()?.total;
    let attempt = record.conversion.next_attempt()?;
    let factory = record.factory_id.clone();

    record.conversion = Conversion::Requested { attempt, amount };
    ext_factory::ext(factory.clone())
        .with_attached_deposit(amount)
        .with_static_gas(CREATE_PROJECT_GAS)
        .create_project(details)
        .then(
            ProposalContract::ext(env::current_account_id())
                .with_static_gas(ON_PROJECT_CREATED_GAS)
                .on_project_created(attempt),
        );

    CrowdfundEvent::ConversionRequested {
        factory,
        attempt,
        amount,
    }
    .emit();
    Ok(())
}
