//! Delta and rate computation between two process snapshots.
//!
//! This module is the single place where cumulative counters turn into
//! per-interval figures. Every function is pure: the same pair of snapshots
//! always yields the same result.
//!
//! CPU share is measured against system-wide ticks:
//!
//! ```text
//! cpu% = Δprocess_ticks * 100 / Δsystem_ticks
//! ```
//!
//! `Δsystem_ticks` covers every core, so the figure is a share of total host
//! capacity. A process saturating one core of an 8-core host reports 12.5%.

use crate::storage::model::ProcessSnapshot;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Difference of a cumulative counter, clamped to zero on regression or wrap.
pub fn counter_delta(curr: u64, prev: u64) -> u64 {
    curr.saturating_sub(prev)
}

/// Bytes per second over `elapsed_ms`; zero when no time elapsed.
pub fn rate_per_sec(delta: u64, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    delta as f64 * 1000.0 / elapsed_ms as f64
}

/// Wall-clock milliseconds from `previous` to `current`, zero if the clock
/// went backwards.
pub fn elapsed_ms(previous: &ProcessSnapshot, current: &ProcessSnapshot) -> u64 {
    (current.timestamp - previous.timestamp)
        .num_milliseconds()
        .max(0) as u64
}

// ---------------------------------------------------------------------------
// Delta structs
// ---------------------------------------------------------------------------

/// CPU tick consumption between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuDelta {
    pub process_ticks: u64,
    pub system_ticks: u64,
    pub elapsed_ms: u64,
}

impl CpuDelta {
    /// Process share of all system ticks, in percent. Zero when the system
    /// tick counter did not advance.
    pub fn percent(&self) -> f64 {
        if self.system_ticks == 0 {
            return 0.0;
        }
        self.process_ticks as f64 * 100.0 / self.system_ticks as f64
    }
}

/// Storage I/O between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IoDelta {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub elapsed_ms: u64,
}

impl IoDelta {
    pub fn read_rate(&self) -> f64 {
        rate_per_sec(self.read_bytes, self.elapsed_ms)
    }

    pub fn write_rate(&self) -> f64 {
        rate_per_sec(self.write_bytes, self.elapsed_ms)
    }
}

/// Network traffic between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkDelta {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub elapsed_ms: u64,
}

impl NetworkDelta {
    pub fn rx_rate(&self) -> f64 {
        rate_per_sec(self.rx_bytes, self.elapsed_ms)
    }

    pub fn tx_rate(&self) -> f64 {
        rate_per_sec(self.tx_bytes, self.elapsed_ms)
    }

    /// Combined rx + tx bytes per second, used by the adaptive cadence.
    pub fn combined_rate(&self) -> f64 {
        rate_per_sec(
            self.rx_bytes.saturating_add(self.tx_bytes),
            self.elapsed_ms,
        )
    }
}

/// Everything derived from one (previous, current) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleDelta {
    pub cpu: CpuDelta,
    pub io: IoDelta,
    pub network: NetworkDelta,
}

impl SampleDelta {
    pub fn cpu_percent(&self) -> f64 {
        self.cpu.percent()
    }

    /// True when the pair actually spans time, i.e. the rates mean something.
    pub fn has_interval(&self) -> bool {
        self.cpu.elapsed_ms > 0
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Computes deltas and rates between `previous` and `current`.
///
/// Returns an all-zero [`SampleDelta`] when there is no previous snapshot or
/// when it belongs to a different pid.
pub fn compute(previous: Option<&ProcessSnapshot>, current: &ProcessSnapshot) -> SampleDelta {
    let Some(previous) = previous.filter(|p| p.pid == current.pid) else {
        return SampleDelta::default();
    };

    let elapsed_ms = elapsed_ms(previous, current);

    SampleDelta {
        cpu: CpuDelta {
            process_ticks: counter_delta(current.cpu_ticks, previous.cpu_ticks),
            system_ticks: counter_delta(current.system_cpu_ticks, previous.system_cpu_ticks),
            elapsed_ms,
        },
        io: IoDelta {
            read_bytes: counter_delta(current.io_read_bytes, previous.io_read_bytes),
            write_bytes: counter_delta(current.io_write_bytes, previous.io_write_bytes),
            elapsed_ms,
        },
        network: NetworkDelta {
            rx_bytes: counter_delta(current.net_rx_bytes, previous.net_rx_bytes),
            tx_bytes: counter_delta(current.net_tx_bytes, previous.net_tx_bytes),
            elapsed_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn snap(pid: u32, offset_ms: i64, cpu: u64, sys: u64) -> ProcessSnapshot {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut s = ProcessSnapshot::new(pid, base + Duration::milliseconds(offset_ms));
        s.cpu_ticks = cpu;
        s.system_cpu_ticks = sys;
        s
    }

    #[test]
    fn cpu_percent_against_system_ticks() {
        let a = snap(100, 0, 1000, 10_000);
        let b = snap(100, 5000, 1100, 10_500);

        let delta = compute(Some(&a), &b);

        assert_eq!(delta.cpu.process_ticks, 100);
        assert_eq!(delta.cpu.system_ticks, 500);
        assert_eq!(delta.cpu.elapsed_ms, 5000);
        assert_eq!(delta.cpu_percent(), 20.0);
    }

    #[test]
    fn single_core_on_eight_cores_is_one_eighth() {
        // 5 s on 8 cores at 100 Hz: 4000 system ticks, 500 for the process.
        let a = snap(1, 0, 0, 0);
        let b = snap(1, 5000, 500, 4000);
        assert_eq!(compute(Some(&a), &b).cpu_percent(), 12.5);
    }

    #[test]
    fn cpu_counter_regression_clamps_to_zero() {
        let a = snap(100, 0, 5000, 10_000);
        let b = snap(100, 1000, 10, 10_100);

        let delta = compute(Some(&a), &b);

        assert_eq!(delta.cpu.process_ticks, 0);
        assert_eq!(delta.cpu_percent(), 0.0);
    }

    #[test]
    fn stalled_system_ticks_give_zero_percent() {
        let a = snap(100, 0, 1000, 10_000);
        let b = snap(100, 1000, 1100, 10_000);
        assert_eq!(compute(Some(&a), &b).cpu_percent(), 0.0);
    }

    #[test]
    fn missing_previous_is_all_zero() {
        let b = snap(100, 5000, 1100, 10_500);
        assert_eq!(compute(None, &b), SampleDelta::default());
    }

    #[test]
    fn mismatched_pid_is_all_zero() {
        let mut a = snap(100, 0, 1000, 10_000);
        a.net_rx_bytes = 10;
        let mut b = snap(101, 5000, 1100, 10_500);
        b.net_rx_bytes = 10_000;

        let delta = compute(Some(&a), &b);

        assert_eq!(delta, SampleDelta::default());
        assert!(!delta.has_interval());
    }

    #[test]
    fn io_and_network_deltas() {
        let mut a = snap(7, 0, 0, 0);
        a.io_read_bytes = 1000;
        a.io_write_bytes = 4000;
        a.net_rx_bytes = 10_000;
        a.net_tx_bytes = 20_000;
        let mut b = snap(7, 2000, 0, 0);
        b.io_read_bytes = 3000;
        b.io_write_bytes = 3000; // regressed
        b.net_rx_bytes = 12_000;
        b.net_tx_bytes = 21_000;

        let delta = compute(Some(&a), &b);

        assert_eq!(delta.io.read_bytes, 2000);
        assert_eq!(delta.io.write_bytes, 0);
        assert_eq!(delta.io.read_rate(), 1000.0);
        assert_eq!(delta.io.write_rate(), 0.0);
        assert_eq!(delta.network.rx_bytes, 2000);
        assert_eq!(delta.network.tx_bytes, 1000);
        assert_eq!(delta.network.rx_rate(), 1000.0);
        assert_eq!(delta.network.tx_rate(), 500.0);
        assert_eq!(delta.network.combined_rate(), 1500.0);
    }

    #[test]
    fn zero_elapsed_gives_zero_rate() {
        let mut a = snap(7, 0, 0, 0);
        a.net_rx_bytes = 0;
        let mut b = snap(7, 0, 0, 0);
        b.net_rx_bytes = 5000;
        b.io_read_bytes = 5000;

        let delta = compute(Some(&a), &b);

        assert_eq!(delta.network.rx_bytes, 5000);
        assert_eq!(delta.network.rx_rate(), 0.0);
        assert_eq!(delta.io.read_rate(), 0.0);
        assert!(!delta.has_interval());
    }

    #[test]
    fn clock_going_backwards_gives_zero_elapsed() {
        let a = snap(7, 5000, 0, 0);
        let b = snap(7, 0, 0, 0);
        assert_eq!(elapsed_ms(&a, &b), 0);
    }

    #[test]
    fn compute_is_idempotent() {
        let mut a = snap(9, 0, 123, 4567);
        a.net_tx_bytes = 77;
        let mut b = snap(9, 3333, 456, 9999);
        b.net_tx_bytes = 7_777;

        let first = compute(Some(&a), &b);
        let second = compute(Some(&a), &b);

        assert_eq!(first, second);
        assert_eq!(
            first.cpu_percent().to_bits(),
            second.cpu_percent().to_bits()
        );
        assert_eq!(
            first.network.combined_rate().to_bits(),
            second.network.combined_rate().to_bits()
        );
    }

    #[test]
    fn rate_helper() {
        assert_eq!(rate_per_sec(500, 1000), 500.0);
        assert_eq!(rate_per_sec(2500, 5000), 500.0);
        assert_eq!(rate_per_sec(u64::MAX, 0), 0.0);
    }
}
