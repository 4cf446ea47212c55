//! NEAR JSON-RPC client: walks final blocks and decodes crowdfund events.
//!
//! For each block the indexer reads the chunks included at that height, picks
//! the transactions addressed to the factory or one of its sub-accounts, and
//! reads their complete execution outcome with `tx`. Every receipt of such a
//! transaction is covered, so cross-contract callbacks that execute in later
//! blocks are attributed to the block the transaction was included in.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC is unreachable, rate-limits,
//!   or reports a transient server error, up to [`MAX_BACKOFF_SECS`] seconds.
//! * A height with no block (skipped by the chain) is indexed as empty.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, NewEvent, STANDARD};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

const EVENT_PREFIX: &str = "EVENT_JSON:";

/// Server-side error causes that go away on their own.
const TRANSIENT_CAUSES: [&str; 3] = ["TIMEOUT_ERROR", "INTERNAL_ERROR", "NO_SYNCED_BLOCKS"];

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub name: Option<String>,
    pub cause: Option<ErrorCause>,
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorCause {
    pub name: String,
}

impl RpcError {
    fn cause_name(&self) -> String {
        self.cause
            .as_ref()
            .map(|c| c.name.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| self.code.to_string())
    }

    fn detail(&self) -> String {
        match &self.data {
            Some(Value::String(data)) => data.clone(),
            _ => self.message.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BlockView {
    pub header: BlockHeader,
    pub chunks: Vec<ChunkHeader>,
}

#[derive(Debug, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChunkHeader {
    pub chunk_hash: String,
    /// Differs from the block height when the shard produced no new chunk.
    pub height_included: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChunkView {
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionView {
    pub hash: String,
    pub signer_id: String,
    pub receiver_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TxStatus {
    pub transaction: TransactionView,
    pub receipts_outcome: Vec<ReceiptOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptOutcome {
    pub id: String,
    pub outcome: ExecutionOutcome,
}

#[derive(Debug, Deserialize)]
pub struct ExecutionOutcome {
    pub logs: Vec<String>,
    pub executor_id: String,
    /// `{"SuccessValue": ..}`, `{"SuccessReceiptId": ..}` or `{"Failure": ..}`.
    pub status: Value,
}

impl ExecutionOutcome {
    fn failed(&self) -> bool {
        self.status.get("Failure").is_some()
    }
}

/// One NEP-297 log line.
#[derive(Debug, Deserialize)]
pub struct NepEvent {
    pub standard: String,
    pub version: String,
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Height of the latest final block.
pub async fn final_height(client: &Client, rpc_url: &str) -> Result<u64> {
    let value = rpc_call(client, rpc_url, "block", json!({ "finality": "final" })).await?;
    let block: BlockView = serde_json::from_value(value)?;
    Ok(block.header.height)
}

/// Every crowdfund event logged by transactions included at `height`.
pub async fn fetch_block_events(
    client: &Client,
    rpc_url: &str,
    factory: &str,
    height: u64,
) -> Result<Vec<NewEvent>> {
    let Some(block) = fetch_block(client, rpc_url, height).await? else {
        debug!("No block at height {height}");
        return Ok(Vec::new());
    };

    let mut events = Vec::new();
    for chunk in block
        .chunks
        .iter()
        .filter(|c| c.height_included == block.header.height)
    {
        let chunk = fetch_chunk(client, rpc_url, &chunk.chunk_hash).await?;
        for tx in chunk
            .transactions
            .iter()
            .filter(|tx| is_tracked(&tx.receiver_id, factory))
        {
            let status = fetch_tx(client, rpc_url, tx).await?;
            events.extend(decode_outcomes(&status, &block.header, factory));
        }
    }

    debug!("Block {height}: {} events", events.len());
    Ok(events)
}

async fn fetch_block(client: &Client, rpc_url: &str, height: u64) -> Result<Option<BlockView>> {
    match rpc_call(client, rpc_url, "block", json!({ "block_id": height })).await {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(IndexerError::Rpc { name, .. }) if name == "UNKNOWN_BLOCK" => Ok(None),
        Err(e) => Err(e),
    }
}

async fn fetch_chunk(client: &Client, rpc_url: &str, chunk_hash: &str) -> Result<ChunkView> {
    let value = rpc_call(client, rpc_url, "chunk", json!({ "chunk_id": chunk_hash })).await?;
    Ok(serde_json::from_value(value)?)
}

async fn fetch_tx(client: &Client, rpc_url: &str, tx: &TransactionView) -> Result<TxStatus> {
    let params = json!({
        "tx_hash": tx.hash,
        "sender_account_id": tx.signer_id,
        "wait_until": "FINAL",
    });
    let value = rpc_call(client, rpc_url, "tx", params).await?;
    Ok(serde_json::from_value(value)?)
}

/// Post one JSON-RPC request, retrying transient failures with back-off.
async fn rpc_call(client: &Client, rpc_url: &str, method: &str, params: Value) -> Result<Value> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": "indexer",
                "method": method,
                "params": params,
            }))
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {backoff}s)");
            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
            continue;
        }

        let body: RpcResponse = resp.json().await?;
        if let Some(err) = body.error {
            let name = err.cause_name();
            if TRANSIENT_CAUSES.contains(&name.as_str()) {
                warn!("RPC soft error (will retry in {backoff}s): {name} {}", err.detail());
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
            return Err(IndexerError::Rpc {
                name,
                message: err.detail(),
            });
        }

        return body
            .result
            .ok_or_else(|| IndexerError::EventParse(format!("Empty result from {method}")));
    }
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// The factory itself or one of its direct sub-accounts.
pub fn is_tracked(account: &str, factory: &str) -> bool {
    account == factory
        || account
            .strip_suffix(factory)
            .and_then(|prefix| prefix.strip_suffix('.'))
            .is_some_and(|name| !name.is_empty() && !name.contains('.'))
}

/// Decode the crowdfund events logged by the successful receipts of `status`
/// that executed on tracked accounts.
pub fn decode_outcomes(status: &TxStatus, header: &BlockHeader, factory: &str) -> Vec<NewEvent> {
    status
        .receipts_outcome
        .iter()
        .filter(|r| is_tracked(&r.outcome.executor_id, factory) && !r.outcome.failed())
        .flat_map(|receipt| {
            receipt
                .outcome
                .logs
                .iter()
                .enumerate()
                .filter_map(move |(index, line)| {
                    let event = parse_event_log(line)?;
                    Some(decode_single(receipt, index, event, &status.transaction.hash, header))
                })
        })
        .collect()
}

/// Parse a log line as a crowdfund NEP-297 event. Other logs are ignored.
pub fn parse_event_log(line: &str) -> Option<NepEvent> {
    let body = line.strip_prefix(EVENT_PREFIX)?;
    match serde_json::from_str::<NepEvent>(body.trim()) {
        Ok(event) if event.standard == STANDARD => Some(event),
        Ok(_) => None,
        Err(e) => {
            warn!("Skipping malformed event log: {e}");
            None
        }
    }
}

fn decode_single(
    receipt: &ReceiptOutcome,
    log_index: usize,
    event: NepEvent,
    tx_hash: &str,
    header: &BlockHeader,
) -> NewEvent {
    let kind = EventKind::from_name(&event.event);
    let (actor, amount) = decode_data(&event.data, kind);
    let payload = json!({
        "version": event.version,
        "event": event.event,
        "data": event.data,
    });

    NewEvent {
        receipt_id: receipt.id.clone(),
        log_index: log_index as i64,
        tx_hash: tx_hash.to_string(),
        block_height: header.height as i64,
        timestamp: (header.timestamp / 1_000_000_000) as i64,
        contract: receipt.outcome.executor_id.clone(),
        kind: kind.as_str().to_string(),
        actor,
        amount,
        payload: payload.to_string(),
    }
}

/// Pull the counterparty account and the headline amount out of `data`.
fn decode_data(value: &Value, kind: EventKind) -> (Option<String>, Option<String>) {
    let field = |key: &str| extract_field(value, &[key]);
    match kind {
        EventKind::ProposalInitialized => (field("factory"), None),
        EventKind::ProposalConfigured => (field("author"), field("goal")),
        EventKind::SupporterAdded | EventKind::FundsAdded => (field("account"), field("amount")),
        EventKind::ProposalFunded => (None, field("total")),
        EventKind::ConversionRequested => (field("factory"), field("amount")),
        EventKind::ConversionConfirmed => (field("project"), None),
        EventKind::ConversionFailed => (None, None),
        EventKind::ProjectInitialized | EventKind::ProposalRegistered => (field("proposal"), None),
        EventKind::ProjectConfigured => (field("owner"), field("budget")),
        EventKind::ContributorSet => (field("account"), None),
        EventKind::ExpenseAdded => (None, field("amount")),
        EventKind::ProjectCreated => (field("project"), field("amount")),
        EventKind::Unknown => (
            extract_field(value, &["account", "owner", "author"]),
            extract_field(value, &["amount"]),
        ),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
