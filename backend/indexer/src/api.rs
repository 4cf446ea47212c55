//! Axum REST API handlers over the event index.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db;
use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, EventRow};

const DEFAULT_PAGE: i64 = 100;
const MAX_PAGE: i64 = 1_000;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub after: i64,
    pub limit: Option<i64>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub account: String,
    pub count: usize,
    pub events: Vec<EventRow>,
}

#[derive(Debug, Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRow>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub last_block: i64,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        last_block: db::get_last_block(&state.pool).await?,
    }))
}

/// `GET /events?after=<id>&limit=<n>&kind=<kind>`
///
/// Returns indexed events across all accounts, oldest first.
pub async fn get_all_events(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<AllEventsResponse>> {
    if query.after < 0 {
        return Err(IndexerError::InvalidQuery("after must not be negative".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE);
    if !(1..=MAX_PAGE).contains(&limit) {
        return Err(IndexerError::InvalidQuery(format!("limit must be 1..={MAX_PAGE}")));
    }
    let kind = match query.kind.as_deref() {
        None => None,
        Some(name) => match EventKind::from_name(name) {
            EventKind::Unknown => {
                return Err(IndexerError::InvalidQuery(format!("unknown event kind `{name}`")))
            }
            kind => Some(kind.as_str()),
        },
    };

    let events = db::get_events(&state.pool, query.after, limit, kind).await?;
    Ok(Json(AllEventsResponse {
        count: events.len(),
        events,
    }))
}

/// `GET /events/:id`
pub async fn get_event(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<EventRow>> {
    db::get_event(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| IndexerError::NotFound(format!("event {id}")))
}

/// `GET /accounts/:id/events`
///
/// Returns indexed events logged by, or naming, the given account.
pub async fn get_account_events(
    State(state): State<Arc<ApiState>>,
    Path(account): Path<String>,
) -> Result<Json<EventsResponse>> {
    if !is_valid_account_id(&account) {
        return Err(IndexerError::InvalidQuery(format!("invalid account id `{account}`")));
    }
    let events = db::get_events_for_account(&state.pool, &account).await?;
    Ok(Json(EventsResponse {
        account,
        count: events.len(),
        events,
    }))
}

/// NEAR account id rules: 2 to 64 characters of `a-z`, `0-9` and `-_.`,
/// with separators only between alphanumerics.
fn is_valid_account_id(id: &str) -> bool {
    if !(2..=64).contains(&id.len()) {
        return false;
    }
    let mut last_was_separator = true;
    for c in id.chars() {
        match c {
            'a'..='z' | '0'..='9' => last_was_separator = false,
            '-' | '_' | '.' if !last_was_separator => last_was_separator = true,
            _ => return false,
        }
    }
    !last_was_separator
}
