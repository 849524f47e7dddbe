//! procwatch - per-process resource sampler.
//!
//! Provides:
//! - `collector`: `/proc` snapshot reading and process discovery
//! - `rates`: deltas and rates between two snapshots
//! - `storage`: snapshot/record models and the bounded history
//! - `monitor`: timer-driven sampling with adaptive cadence and death detection
//!
//! With `http` feature (default):
//! - `api`: axum router serving the history as JSON

pub mod collector;
pub mod monitor;
pub mod rates;
pub mod storage;

#[cfg(feature = "http")]
pub mod api;

/// Crate version, as reported by the daemon.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
