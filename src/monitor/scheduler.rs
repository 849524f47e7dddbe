//! Timer-driven sampling of registered processes.
//!
//! Each registration owns one pending one-shot timer task. A tick reads a
//! snapshot, applies it to the registration's [`ProcessMonitor`], publishes
//! the outcome and arms the next timer with the interval the outcome asks
//! for. Stopping a registration aborts its pending timer. A tick that was
//! already past its sleep when the registration was stopped (or replaced) is
//! recognised by its generation and discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::collector::SnapshotSource;
use crate::storage::HistoryStore;

use super::config::SamplingConfig;
use super::error::MonitorError;
use super::observer::MetricsObserver;
use super::state::{ProcessMonitor, TickOutcome};

/// Result of [`Scheduler::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The pid already had a registration; nothing changed.
    AlreadyMonitoring,
}

struct Registration {
    generation: u64,
    monitor: ProcessMonitor,
    timer: Option<AbortHandle>,
    runtime: Handle,
}

struct Shared<S> {
    source: S,
    history: Arc<HistoryStore>,
    observers: RwLock<Vec<Arc<dyn MetricsObserver>>>,
    registrations: Mutex<HashMap<u32, Registration>>,
    next_generation: AtomicU64,
}

impl<S> Shared<S> {
    fn registrations(&self) -> MutexGuard<'_, HashMap<u32, Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> Vec<Arc<dyn MetricsObserver>> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S> Drop for Shared<S> {
    fn drop(&mut self) {
        let registrations = self
            .registrations
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, registration) in registrations.drain() {
            if let Some(timer) = registration.timer {
                timer.abort();
            }
        }
    }
}

/// Schedules and runs sampling for any number of processes.
///
/// Cloning is cheap and every clone drives the same set of registrations.
/// Dropping the last clone cancels all pending timers.
pub struct Scheduler<S: SnapshotSource> {
    shared: Arc<Shared<S>>,
}

impl<S: SnapshotSource> Clone for Scheduler<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: SnapshotSource> Scheduler<S> {
    pub fn new(source: S, history: Arc<HistoryStore>) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                history,
                observers: RwLock::new(Vec::new()),
                registrations: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Registers an observer for every monitored process.
    pub fn add_observer(&self, observer: Arc<dyn MetricsObserver>) {
        self.shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.shared.history
    }

    /// Starts monitoring `pid`. The first sample is taken right away.
    ///
    /// Must be called from within a Tokio runtime, which then drives the
    /// timers of this registration.
    pub fn start(
        &self,
        pid: i32,
        owner: Option<u32>,
        config: SamplingConfig,
    ) -> Result<StartOutcome, MonitorError> {
        let pid = u32::try_from(pid)
            .ok()
            .filter(|pid| *pid > 0)
            .ok_or_else(|| MonitorError::InvalidArgument(format!("invalid pid {pid}")))?;
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        let mut registrations = self.shared.registrations();
        if registrations.contains_key(&pid) {
            debug!(pid, "already monitoring");
            return Ok(StartOutcome::AlreadyMonitoring);
        }

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
        let timer = spawn_tick(&self.shared, &runtime, pid, generation, Duration::ZERO);
        registrations.insert(
            pid,
            Registration {
                generation,
                monitor: ProcessMonitor::new(owner, config),
                timer: Some(timer),
                runtime,
            },
        );

        info!(
            pid,
            owner = ?owner,
            interval = ?config.interval,
            idle_interval = ?config.idle_interval,
            cadence = ?config.cadence,
            "monitoring started"
        );
        Ok(StartOutcome::Started)
    }

    /// Stops monitoring `pid`. Returns false if it was not monitored.
    pub fn stop(&self, pid: u32) -> bool {
        let removed = self.shared.registrations().remove(&pid);
        match removed {
            Some(registration) => {
                if let Some(timer) = registration.timer {
                    timer.abort();
                }
                info!(pid, "monitoring stopped");
                true
            }
            None => false,
        }
    }

    /// Stops every registration.
    pub fn stop_all(&self) {
        let drained: Vec<(u32, Registration)> = self.shared.registrations().drain().collect();
        for (pid, registration) in drained {
            if let Some(timer) = registration.timer {
                timer.abort();
            }
            debug!(pid, "monitoring stopped");
        }
    }

    pub fn is_monitoring(&self, pid: u32) -> bool {
        self.shared.registrations().contains_key(&pid)
    }

    /// Currently monitored pids, ascending.
    pub fn monitored_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.shared.registrations().keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    pub fn len(&self) -> usize {
        self.shared.registrations().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn spawn_tick<S: SnapshotSource>(
    shared: &Arc<Shared<S>>,
    runtime: &Handle,
    pid: u32,
    generation: u64,
    delay: Duration,
) -> AbortHandle {
    let weak = Arc::downgrade(shared);
    runtime
        .spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tick(weak, pid, generation);
        })
        .abort_handle()
}

fn tick<S: SnapshotSource>(weak: Weak<Shared<S>>, pid: u32, generation: u64) {
    let Some(shared) = weak.upgrade() else {
        return;
    };

    let owner = match shared.registrations().get(&pid) {
        Some(registration) if registration.generation == generation => {
            registration.monitor.owner()
        }
        _ => return,
    };

    let read = shared.source.read_snapshot(pid, owner);

    let outcome = {
        let mut registrations = shared.registrations();
        let Some(registration) = registrations.get_mut(&pid) else {
            return;
        };
        if registration.generation != generation {
            return;
        }
        registration.timer = None;
        let outcome = registration.monitor.observe(read);
        match &outcome {
            TickOutcome::Sampled { record, .. } => shared.history.append(record.clone()),
            TickOutcome::Failed { .. } => {}
            TickOutcome::Died { last_record, .. } => {
                registrations.remove(&pid);
                if let Some(record) = last_record {
                    shared.history.append(record.death_marker(Utc::now()));
                }
            }
        }
        outcome
    };

    notify(&shared, pid, &outcome);

    let Some(delay) = outcome.next_interval() else {
        return;
    };
    let mut registrations = shared.registrations();
    if let Some(registration) = registrations.get_mut(&pid) {
        if registration.generation == generation {
            let timer = spawn_tick(&shared, &registration.runtime, pid, generation, delay);
            registration.timer = Some(timer);
            debug!(pid, next_in = ?delay, "next sample scheduled");
        }
    }
}

fn notify<S>(shared: &Shared<S>, pid: u32, outcome: &TickOutcome) {
    let observers = shared.observers();
    match outcome {
        TickOutcome::Sampled { record, delta, .. } => {
            for observer in &observers {
                observer.metrics_collected(record, &delta.io, &delta.network);
            }
        }
        TickOutcome::Failed {
            error, failures, ..
        } => {
            debug!(pid, failures, "sample failed");
            for observer in &observers {
                observer.monitor_error(pid, error);
            }
        }
        TickOutcome::Died { last_record, cause } => {
            info!(pid, ?cause, "process died, monitoring stopped");
            for observer in &observers {
                observer.process_died(pid, last_record.as_ref());
            }
        }
    }
}
