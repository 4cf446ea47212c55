//! Long-running background task that follows final NEAR blocks and writes
//! decoded crowdfund events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Run the indexer loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting, factory: {}", state.config.factory_account);

    let mut next_block = loop {
        match resume_height(&state).await {
            Ok(height) => break height,
            Err(e) => {
                error!("Could not determine start block: {e}");
                if wait_or_stop(&state, &shutdown).await {
                    return;
                }
            }
        }
    };
    info!("Resuming from block {next_block}");

    loop {
        match poll_once(&state, next_block).await {
            Ok(next) => next_block = next,
            Err(e) => error!("Indexer poll error at block {next_block}: {e}"),
        }
        if wait_or_stop(&state, &shutdown).await {
            info!("Indexer stopped at block {next_block}");
            return;
        }
    }
}

/// Sleep for the poll interval. Returns `true` if shutdown was requested.
async fn wait_or_stop(state: &IndexerState, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => true,
        _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => false,
    }
}

/// The block after the stored cursor, else the configured start block, else
/// the current final tip.
async fn resume_height(state: &IndexerState) -> Result<u64> {
    let last = db::get_last_block(&state.pool).await?;
    if last > 0 {
        return Ok(last as u64 + 1);
    }
    if state.config.start_block > 0 {
        return Ok(state.config.start_block);
    }
    rpc::final_height(&state.client, &state.config.rpc_url).await
}

/// Index up to `blocks_per_poll` final blocks starting at `next_block`.
///
/// Returns the next block to index. Each block is committed with its cursor
/// update, so an error part-way through resumes at the failed block.
async fn poll_once(state: &IndexerState, next_block: u64) -> Result<u64> {
    let tip = rpc::final_height(&state.client, &state.config.rpc_url).await?;
    let Some(end) = scan_end(next_block, tip, state.config.blocks_per_poll) else {
        return Ok(next_block);
    };

    for height in next_block..=end {
        let events = rpc::fetch_block_events(
            &state.client,
            &state.config.rpc_url,
            &state.config.factory_account,
            height,
        )
        .await?;
        let inserted = db::insert_block_events(&state.pool, height as i64, &events).await?;
        if inserted > 0 {
            info!("Block {height}: {inserted} new events stored");
        }
    }
    Ok(end + 1)
}

/// Last block of the next scan window, or `None` when caught up with `tip`.
fn scan_end(next_block: u64, tip: u64, blocks_per_poll: u64) -> Option<u64> {
    if next_block > tip {
        return None;
    }
    Some(tip.min(next_block.saturating_add(blocks_per_poll - 1)))
}
