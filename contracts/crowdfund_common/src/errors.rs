//! Failures surfaced by the crowdfund contracts.
//!
//! Entry points return `Result<_, Error>` through `#[handle_result]`; an `Err`
//! aborts the receipt, so none of the call's writes, transfers or scheduled
//! promises survive it.

use near_sdk::{env, FunctionError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("contract is not initialized")]
    NotInitialized,
    #[error("contract is already initialized")]
    AlreadyInitialized,
    #[error("attached stake is below the minimum account balance")]
    InsufficientStake,
    #[error("contract is not configured")]
    NotConfigured,
    #[error("proposal is already fully funded")]
    AlreadyFunded,
    #[error("attached deposit is below the minimum deposit")]
    DepositTooLow,
    #[error("caller is not a proposal registered with this factory")]
    UnknownProposal,

    #[error("configuration can no longer be changed")]
    ConfigurationLocked,
    #[error("invalid funding terms")]
    InvalidFundingTerms,
    #[error("expense exceeds the remaining budget")]
    ExceedsBudget,
    #[error("project has spent more than its budget")]
    BudgetOverdrawn,
    #[error("caller is not authorized")]
    NotAuthorized,
    #[error("proposal has already been converted")]
    AlreadyConverted,
    #[error("no failed conversion to retry")]
    ConversionNotFailed,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error("prepaid gas cannot cover the conversion request")]
    GasExhausted,
    #[error("no {0} code stored on the factory")]
    CodeNotStored(&'static str),
    #[error("invalid account id `{0}`")]
    InvalidAccountId(String),
}

impl Error {
    /// Stable numeric code for the failure.
    pub fn code(&self) -> u32 {
        match self {
            Self::NotInitialized => 1,
            Self::AlreadyInitialized => 2,
            Self::InsufficientStake => 3,
            Self::NotConfigured => 4,
            Self::AlreadyFunded => 5,
            Self::DepositTooLow => 6,
            Self::UnknownProposal => 7,
            Self::ConfigurationLocked => 8,
            Self::InvalidFundingTerms => 9,
            Self::ExceedsBudget => 10,
            Self::BudgetOverdrawn => 11,
            Self::NotAuthorized => 12,
            Self::AlreadyConverted => 13,
            Self::ConversionNotFailed => 14,
            Self::ArithmeticOverflow => 15,
            Self::GasExhausted => 16,
            Self::CodeNotStored(_) => 17,
            Self::InvalidAccountId(_) => 18,
        }
    }
}

impl FunctionError for Error {
    fn panic(&self) -> ! {
        env::panic_str(&format!("E{}: {self}", self.code()))
    }
}
