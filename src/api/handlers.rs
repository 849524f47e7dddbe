//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;

use crate::storage::HistoryStore;
use crate::storage::model::ResourceRecord;

#[derive(Debug, Deserialize)]
pub(crate) struct StatsQuery {
    /// Only return the newest `limit` records.
    limit: Option<usize>,
}

pub(crate) async fn handle_stats(
    State(history): State<Arc<HistoryStore>>,
    Query(query): Query<StatsQuery>,
) -> Json<Vec<ResourceRecord>> {
    let records = match query.limit {
        Some(limit) => history.latest(limit),
        None => history.snapshot_all(),
    };
    Json(records)
}

pub(crate) async fn handle_health() -> &'static str {
    "OK"
}
