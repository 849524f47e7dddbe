//! Sampling scheduler: owns the monitoring lifecycle of each process.
//!
//! ```text
//! timer fires ─► SnapshotSource::read_snapshot ─► ProcessMonitor::observe
//!                                                  │  (rates::compute)
//!                     ┌────────────────────────────┼──────────────────┐
//!                     ▼                            ▼                  ▼
//!               HistoryStore::append      MetricsObserver::*    re-arm timer
//! ```

mod config;
mod error;
mod observer;
mod scheduler;
mod state;

pub use config::{
    Cadence, DEFAULT_FAILURE_THRESHOLD, DEFAULT_IDLE_INTERVAL, DEFAULT_IDLE_THRESHOLD,
    DEFAULT_INTERVAL, SamplingConfig,
};
pub use error::MonitorError;
pub use observer::{LoggingObserver, MetricsObserver};
pub use scheduler::{Scheduler, StartOutcome};
pub use state::{DeathCause, ProcessMonitor, TickOutcome};
