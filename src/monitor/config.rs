//! Per-registration sampling configuration.

use std::time::Duration;

use crate::rates::SampleDelta;

use super::error::MonitorError;

/// Sampling interval while the process is active.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Sampling interval while the process is idle.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(30);

/// Combined rx + tx bytes/sec below which a process counts as idle.
pub const DEFAULT_IDLE_THRESHOLD: f64 = 1024.0;

/// Consecutive failed reads after which a process is declared dead.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// How the next tick is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cadence {
    /// Slow down to the idle interval while network traffic is low.
    #[default]
    Adaptive,
    /// Always sample at the active interval.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub interval: Duration,
    pub idle_interval: Duration,
    /// Bytes per second.
    pub idle_threshold: f64,
    pub failure_threshold: u32,
    pub cadence: Cadence,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cadence: Cadence::Adaptive,
        }
    }
}

impl SamplingConfig {
    /// Same configuration with a fixed cadence.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            cadence: Cadence::Fixed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.interval.is_zero() {
            return Err(MonitorError::InvalidArgument(
                "sampling interval must be positive".to_string(),
            ));
        }
        if self.cadence == Cadence::Adaptive && self.idle_interval.is_zero() {
            return Err(MonitorError::InvalidArgument(
                "idle interval must be positive".to_string(),
            ));
        }
        if self.idle_threshold.is_nan() || self.idle_threshold < 0.0 {
            return Err(MonitorError::InvalidArgument(
                "idle threshold must be a non-negative number".to_string(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(MonitorError::InvalidArgument(
                "failure threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Interval until the tick after a successful sample with `delta`.
    ///
    /// A sample without a previous one to compare against (first sample,
    /// zero elapsed time) has no meaningful rate and keeps the active
    /// interval.
    pub fn next_interval(&self, delta: &SampleDelta) -> Duration {
        match self.cadence {
            Cadence::Fixed => self.interval,
            Cadence::Adaptive if !delta.has_interval() => self.interval,
            Cadence::Adaptive => {
                if delta.network.combined_rate() < self.idle_threshold {
                    self.idle_interval
                } else {
                    self.interval
                }
            }
        }
    }
}
