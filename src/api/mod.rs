//! Pull interface over the sampling history.
//!
//! | Method | Path      | Response                                   |
//! |--------|-----------|--------------------------------------------|
//! | GET    | `/stats`  | JSON array of records, oldest first        |
//! | GET    | `/health` | `OK`                                       |
//!
//! `/stats` accepts an optional `limit` query parameter that keeps only the
//! newest `limit` records.

mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::storage::HistoryStore;

/// Builds the HTTP router serving `history`.
pub fn router(history: Arc<HistoryStore>) -> Router {
    Router::new()
        .route("/stats", get(handlers::handle_stats))
        .route("/health", get(handlers::handle_health))
        .with_state(history)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
