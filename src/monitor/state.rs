//! Per-process sampling state, independent of any timer.
//!
//! [`ProcessMonitor`] turns the outcome of one read into a [`TickOutcome`]:
//! a record to publish, a failure to report, or a death. The scheduler
//! only decides *when* to call [`ProcessMonitor::observe`].

use std::time::Duration;

use crate::collector::procfs::ReadError;
use crate::rates::{self, SampleDelta};
use crate::storage::model::{ProcessSnapshot, ResourceRecord};

use super::config::SamplingConfig;

/// Why a process was declared dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// `/proc/[pid]` disappeared.
    ProcessGone,
    /// This many consecutive reads failed.
    FailureThreshold(u32),
}

/// Result of feeding one read into a [`ProcessMonitor`].
#[derive(Debug)]
pub enum TickOutcome {
    Sampled {
        record: ResourceRecord,
        delta: SampleDelta,
        next_interval: Duration,
    },
    Failed {
        error: String,
        failures: u32,
        next_interval: Duration,
    },
    Died {
        last_record: Option<ResourceRecord>,
        cause: DeathCause,
    },
}

impl TickOutcome {
    /// Delay until the next tick, `None` once the process is dead.
    pub fn next_interval(&self) -> Option<Duration> {
        match self {
            TickOutcome::Sampled { next_interval, .. }
            | TickOutcome::Failed { next_interval, .. } => Some(*next_interval),
            TickOutcome::Died { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct ProcessMonitor {
    owner: Option<u32>,
    config: SamplingConfig,
    previous: Option<ProcessSnapshot>,
    last_record: Option<ResourceRecord>,
    consecutive_failures: u32,
    current_interval: Duration,
}

impl ProcessMonitor {
    pub fn new(owner: Option<u32>, config: SamplingConfig) -> Self {
        Self {
            owner,
            config,
            previous: None,
            last_record: None,
            consecutive_failures: 0,
            current_interval: config.interval,
        }
    }

    pub fn owner(&self) -> Option<u32> {
        self.owner
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Applies the result of one read.
    pub fn observe(&mut self, read: Result<ProcessSnapshot, ReadError>) -> TickOutcome {
        let snapshot = match read {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_process_gone() => {
                return TickOutcome::Died {
                    last_record: self.last_record.take(),
                    cause: DeathCause::ProcessGone,
                };
            }
            Err(err) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= self.config.failure_threshold {
                    return TickOutcome::Died {
                        last_record: self.last_record.take(),
                        cause: DeathCause::FailureThreshold(self.consecutive_failures),
                    };
                }
                return TickOutcome::Failed {
                    error: err.to_string(),
                    failures: self.consecutive_failures,
                    next_interval: self.current_interval,
                };
            }
        };

        self.consecutive_failures = 0;

        let delta = rates::compute(self.previous.as_ref(), &snapshot);
        let record = ResourceRecord::from_snapshot(&snapshot, delta.cpu_percent());
        let next_interval = self.config.next_interval(&delta);

        self.previous = Some(snapshot);
        self.last_record = Some(record.clone());
        self.current_interval = next_interval;

        TickOutcome::Sampled {
            record,
            delta,
            next_interval,
        }
    }
}
