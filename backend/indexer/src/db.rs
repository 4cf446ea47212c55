//! Database layer: migrations, event queries and the block cursor.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;
use crate::events::{EventRow, NewEvent};

const EVENT_COLUMNS: &str = "id, receipt_id, log_index, tx_hash, block_height, timestamp, \
                             contract, kind, actor, amount, payload, indexed_at";

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Every connection to `:memory:` opens its own empty database, so an
    // in-memory pool must hold exactly one connection for its whole life.
    let options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
    };
    let connect = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = options.connect_with(connect).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// The last block whose events are fully stored, or `0`.
pub async fn get_last_block(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_block FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist the events of block `height` and advance the cursor to it, in one
/// transaction. Log lines that are already stored are ignored.
pub async fn insert_block_events(pool: &SqlitePool, height: i64, events: &[NewEvent]) -> Result<usize> {
    let indexed_at = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (receipt_id, log_index, tx_hash, block_height, timestamp,
                 contract, kind, actor, amount, payload, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ev.receipt_id)
        .bind(ev.log_index)
        .bind(&ev.tx_hash)
        .bind(ev.block_height)
        .bind(ev.timestamp)
        .bind(&ev.contract)
        .bind(&ev.kind)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.payload)
        .bind(indexed_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    sqlx::query("UPDATE indexer_cursor SET last_block = MAX(last_block, ?1) WHERE id = 1")
        .bind(height)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Up to `limit` events with an id greater than `after`, oldest first,
/// optionally restricted to one kind.
pub async fn get_events(
    pool: &SqlitePool,
    after: i64,
    limit: i64,
    kind: Option<&str>,
) -> Result<Vec<EventRow>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events \
         WHERE id > ?1 AND (?2 IS NULL OR kind = ?2) \
         ORDER BY id ASC LIMIT ?3"
    );
    let rows = sqlx::query_as::<_, EventRow>(&sql)
        .bind(after)
        .bind(kind)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Events logged by, or naming, the given account, oldest first.
pub async fn get_events_for_account(pool: &SqlitePool, account: &str) -> Result<Vec<EventRow>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events \
         WHERE contract = ?1 OR actor = ?1 \
         ORDER BY id ASC"
    );
    let rows = sqlx::query_as::<_, EventRow>(&sql)
        .bind(account)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_event(pool: &SqlitePool, id: i64) -> Result<Option<EventRow>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
    let row = sqlx::query_as::<_, EventRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
