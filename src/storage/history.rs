//! Bounded in-memory history of result records.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use super::model::ResourceRecord;

/// Default number of records kept before the oldest is evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Insertion-ordered ring of the most recent [`ResourceRecord`]s.
///
/// Writers take the write lock for the whole evict-and-append step, so a
/// reader never observes the store between the eviction and the append.
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    records: RwLock<VecDeque<ResourceRecord>>,
}

impl HistoryStore {
    /// Creates a store holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a record, evicting the oldest one when the store is full.
    pub fn append(&self, record: ResourceRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Returns all records, oldest first.
    pub fn snapshot_all(&self) -> Vec<ResourceRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.iter().cloned().collect()
    }

    /// Returns the newest `n` records, oldest first.
    pub fn latest(&self, n: usize) -> Vec<ResourceRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::ProcessSnapshot;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::thread;

    fn record(seq: u32) -> ResourceRecord {
        let snap = ProcessSnapshot::new(seq, Utc.timestamp_opt(1_700_000_000 + seq as i64, 0).unwrap());
        ResourceRecord::from_snapshot(&snap, 0.0)
    }

    #[test]
    fn test_append_keeps_order() {
        let store = HistoryStore::new(10);
        for i in 1..=3 {
            store.append(record(i));
        }

        let pids: Vec<u32> = store.snapshot_all().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![1, 2, 3]);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let store = HistoryStore::new(5);
        for i in 1..=6 {
            store.append(record(i));
        }

        let all = store.snapshot_all();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.pid != 1));
        assert_eq!(all.first().map(|r| r.pid), Some(2));
        assert_eq!(all.last().map(|r| r.pid), Some(6));
    }

    #[test]
    fn test_default_capacity() {
        let store = HistoryStore::default();
        for i in 1..=1001 {
            store.append(record(i));
        }

        assert_eq!(store.capacity(), 1000);
        assert_eq!(store.len(), 1000);
        let all = store.snapshot_all();
        assert_eq!(all[0].pid, 2);
        assert_eq!(all[999].pid, 1001);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let store = HistoryStore::new(0);
        store.append(record(1));
        store.append(record(2));

        assert_eq!(store.capacity(), 1);
        assert_eq!(store.snapshot_all()[0].pid, 2);
    }

    #[test]
    fn test_latest() {
        let store = HistoryStore::new(10);
        assert!(store.latest(3).is_empty());
        for i in 1..=5 {
            store.append(record(i));
        }

        let pids: Vec<u32> = store.latest(2).iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![4, 5]);
        assert_eq!(store.latest(50).len(), 5);
        assert!(store.latest(0).is_empty());
    }

    #[test]
    fn test_concurrent_readers_never_see_shrink() {
        let store = Arc::new(HistoryStore::new(64));
        for i in 0..64 {
            store.append(record(i));
        }

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 64..5000 {
                    store.append(record(i));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let all = store.snapshot_all();
                        assert_eq!(all.len(), 64);
                        assert!(all.windows(2).all(|w| w[0].pid < w[1].pid));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.snapshot_all().last().map(|r| r.pid), Some(4999));
    }
}
