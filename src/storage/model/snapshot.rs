//! Raw per-process counters captured at one sampling tick.

use chrono::{DateTime, Utc};

/// Cumulative counters for one process at one point in time.
///
/// Built by the snapshot reader and kept by the scheduler only until the
/// next tick supersedes it. All counters are cumulative since process (or
/// system) start; rates come from the difference of two snapshots, see
/// [`crate::rates`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    /// Wall-clock time the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Display name (`/proc/[pid]/comm`).
    pub name: String,
    /// User + kernel CPU ticks consumed by the process.
    pub cpu_ticks: u64,
    /// CPU ticks elapsed on all cores of the host.
    pub system_cpu_ticks: u64,
    /// Resident set size in bytes.
    pub rss_bytes: u64,
    /// Bytes read from storage, 0 when `/proc/[pid]/io` is unreadable.
    pub io_read_bytes: u64,
    /// Bytes written to storage, 0 when `/proc/[pid]/io` is unreadable.
    pub io_write_bytes: u64,
    /// Network bytes received (system-wide or per owner, see `NetworkSource`).
    pub net_rx_bytes: u64,
    /// Network bytes transmitted.
    pub net_tx_bytes: u64,
    pub alive: bool,
}

impl ProcessSnapshot {
    /// Creates a snapshot with all counters at zero.
    pub fn new(pid: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            pid,
            timestamp,
            name: String::new(),
            cpu_ticks: 0,
            system_cpu_ticks: 0,
            rss_bytes: 0,
            io_read_bytes: 0,
            io_write_bytes: 0,
            net_rx_bytes: 0,
            net_tx_bytes: 0,
            alive: true,
        }
    }

    /// Resident memory in mebibytes.
    pub fn memory_mb(&self) -> f64 {
        self.rss_bytes as f64 / (1024.0 * 1024.0)
    }
}
