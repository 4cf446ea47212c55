//! Event kinds logged by the crowdfund contracts.
//!
//! Every contract logs NEP-297 lines of the form
//! `EVENT_JSON:{"standard":"crowdfund","version":"1.0.0","event":<name>,"data":{..}}`.
//! The names below are the `event` values the contracts emit.

use serde::{Deserialize, Serialize};

/// NEP-297 `standard` value shared by all crowdfund contracts.
pub const STANDARD: &str = "crowdfund";

/// All recognised event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Proposal
    ProposalInitialized,
    ProposalConfigured,
    SupporterAdded,
    ProposalFunded,
    ConversionRequested,
    ConversionConfirmed,
    ConversionFailed,
    // Project
    ProjectInitialized,
    ProjectConfigured,
    FundsAdded,
    ContributorSet,
    ExpenseAdded,
    // Factory
    ProposalRegistered,
    ProjectCreated,
    /// A crowdfund event this indexer does not know yet.
    Unknown,
}

impl EventKind {
    /// Parse the `event` field of a NEP-297 log.
    pub fn from_name(name: &str) -> Self {
        match name {
            "proposal_initialized" => Self::ProposalInitialized,
            "proposal_configured" => Self::ProposalConfigured,
            "supporter_added" => Self::SupporterAdded,
            "proposal_funded" => Self::ProposalFunded,
            "conversion_requested" => Self::ConversionRequested,
            "conversion_confirmed" => Self::ConversionConfirmed,
            "conversion_failed" => Self::ConversionFailed,
            "project_initialized" => Self::ProjectInitialized,
            "project_configured" => Self::ProjectConfigured,
            "funds_added" => Self::FundsAdded,
            "contributor_set" => Self::ContributorSet,
            "expense_added" => Self::ExpenseAdded,
            "proposal_registered" => Self::ProposalRegistered,
            "project_created" => Self::ProjectCreated,
            _ => Self::Unknown,
        }
    }

    /// Identifier stored in the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposalInitialized => "proposal_initialized",
            Self::ProposalConfigured => "proposal_configured",
            Self::SupporterAdded => "supporter_added",
            Self::ProposalFunded => "proposal_funded",
            Self::ConversionRequested => "conversion_requested",
            Self::ConversionConfirmed => "conversion_confirmed",
            Self::ConversionFailed => "conversion_failed",
            Self::ProjectInitialized => "project_initialized",
            Self::ProjectConfigured => "project_configured",
            Self::FundsAdded => "funds_added",
            Self::ContributorSet => "contributor_set",
            Self::ExpenseAdded => "expense_added",
            Self::ProposalRegistered => "proposal_registered",
            Self::ProjectCreated => "project_created",
            Self::Unknown => "unknown",
        }
    }
}

/// A decoded event, ready to be stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub receipt_id: String,
    /// Position of the line among the receipt's logs.
    pub log_index: i64,
    pub tx_hash: String,
    pub block_height: i64,
    /// Block time, Unix seconds.
    pub timestamp: i64,
    /// Account whose receipt logged the event.
    pub contract: String,
    pub kind: String,
    /// The other account the event is about, if any.
    pub actor: Option<String>,
    /// yoctoNEAR as a decimal string; amounts do not fit in an SQLite integer.
    pub amount: Option<String>,
    /// The event's `data` object as JSON.
    pub payload: String,
}

/// An event row as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub receipt_id: String,
    pub log_index: i64,
    pub tx_hash: String,
    pub block_height: i64,
    pub timestamp: i64,
    pub contract: String,
    pub kind: String,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub payload: String,
    pub indexed_at: i64,
}
