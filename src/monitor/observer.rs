//! Push notifications for sampling events.

use tracing::{info, warn};

use crate::rates::{IoDelta, NetworkDelta};
use crate::storage::model::ResourceRecord;

/// Receives sampling events from the [`Scheduler`](super::Scheduler).
///
/// Callbacks run on the timer task that produced the event, so they must not
/// block. Every method defaults to a no-op.
pub trait MetricsObserver: Send + Sync {
    /// A sample was taken and appended to the history.
    fn metrics_collected(&self, _record: &ResourceRecord, _io: &IoDelta, _network: &NetworkDelta) {}

    /// The process was declared dead and its monitoring stopped.
    /// `last_record` is the last successful sample, if any.
    fn process_died(&self, _pid: u32, _last_record: Option<&ResourceRecord>) {}

    /// A read failed without reaching the failure threshold.
    fn monitor_error(&self, _pid: u32, _error: &str) {}
}

/// Writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl MetricsObserver for LoggingObserver {
    fn metrics_collected(&self, record: &ResourceRecord, io: &IoDelta, network: &NetworkDelta) {
        info!(
            "PID {} [{}]: CPU={:.2}%, MEM={:.2} MB",
            record.pid, record.process_name, record.cpu_percent, record.memory_mb
        );
        tracing::debug!(
            pid = record.pid,
            io_read_bps = io.read_rate(),
            io_write_bps = io.write_rate(),
            net_rx_bps = network.rx_rate(),
            net_tx_bps = network.tx_rate(),
            "rates"
        );
    }

    fn process_died(&self, pid: u32, last_record: Option<&ResourceRecord>) {
        match last_record {
            Some(record) => warn!(
                pid,
                name = %record.process_name,
                last_sample = %record.timestamp,
                "process died"
            ),
            None => warn!(pid, "process died before the first sample"),
        }
    }

    fn monitor_error(&self, pid: u32, error: &str) {
        warn!(pid, error, "sampling failed");
    }
}
