//! Result record emitted after every successful sample.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::ProcessSnapshot;

/// One computed sample, as stored in the history and served over HTTP.
///
/// `network_rx_bytes`/`network_tx_bytes` are the cumulative counters at
/// sample time, not per-interval rates. Rates are delivered to push
/// observers as a [`NetworkDelta`](crate::rates::NetworkDelta).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// RFC 3339, always UTC.
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub process_name: String,
    /// Share of total host CPU capacity, not normalised per core.
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub network_rx_bytes: u64,
    pub network_tx_bytes: u64,
    pub alive: bool,
}

impl ResourceRecord {
    /// Builds a record from the current snapshot and its computed CPU share.
    pub fn from_snapshot(snapshot: &ProcessSnapshot, cpu_percent: f64) -> Self {
        let process_name = if snapshot.name.is_empty() {
            "unknown".to_string()
        } else {
            snapshot.name.clone()
        };

        Self {
            timestamp: snapshot.timestamp,
            pid: snapshot.pid,
            process_name,
            cpu_percent,
            memory_mb: snapshot.memory_mb(),
            network_rx_bytes: snapshot.net_rx_bytes,
            network_tx_bytes: snapshot.net_tx_bytes,
            alive: snapshot.alive,
        }
    }

    /// Copy of this record marking the process dead at `at`.
    pub fn death_marker(&self, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            alive: false,
            ..self.clone()
        }
    }
}
