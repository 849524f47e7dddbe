//! Snapshot reader for a single process from `/proc/[pid]/` and the
//! system-wide counters it is measured against.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::collector::procfs::parser::{
    ProcStat, parse_net_dev, parse_proc_io, parse_proc_stat, parse_proc_status,
    parse_qtaguid_stats, parse_total_cpu_ticks,
};
use crate::collector::traits::{FileSystem, SnapshotSource};
use crate::storage::model::ProcessSnapshot;

/// Error type for snapshot reads.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// `/proc/[pid]` is gone: the process exited.
    #[error("process {pid} not found")]
    ProcessNotFound { pid: u32 },
    /// A kernel file had an unexpected shape.
    #[error("malformed data for process {pid}: {reason}")]
    MalformedData { pid: u32, reason: String },
    /// Any other I/O error on a file the snapshot cannot do without.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailure { path: PathBuf, source: io::Error },
}

impl ReadError {
    /// True when the error is an authoritative death signal.
    pub fn is_process_gone(&self) -> bool {
        matches!(self, ReadError::ProcessNotFound { .. })
    }
}

/// Where network counters for a snapshot come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSource {
    /// Sum over every interface in `/proc/net/dev`. Over-counts when other
    /// processes share the host.
    System,
    /// Per-uid counters from `/proc/net/xt_qtaguid/stats` (Android kernels).
    /// Both counters read as 0 when the kernel does not expose them.
    Owner(u32),
}

impl NetworkSource {
    pub fn from_owner(owner: Option<u32>) -> Self {
        owner.map_or(NetworkSource::System, NetworkSource::Owner)
    }
}

/// Reads [`ProcessSnapshot`]s through a [`FileSystem`].
///
/// No state is kept between calls: each read reflects the kernel counters at
/// the time of the call.
pub struct SnapshotReader<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> SnapshotReader<F> {
    /// Creates a new reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Reads a fresh snapshot of `pid`.
    ///
    /// CPU and memory are mandatory. Storage I/O and network counters are
    /// optional: when they cannot be read they are reported as 0.
    pub fn read(&self, pid: u32, network: NetworkSource) -> Result<ProcessSnapshot, ReadError> {
        let timestamp = Utc::now();
        let proc_dir = format!("{}/{}", self.proc_path, pid);

        let stat = self.read_stat(pid, &proc_dir)?;
        let system_cpu_ticks = self.read_system_cpu_ticks(pid)?;
        let rss_bytes = self.read_rss_bytes(pid, &proc_dir)?;
        let (io_read_bytes, io_write_bytes) = self.read_io(pid, &proc_dir);
        let (net_rx_bytes, net_tx_bytes) = self.read_network(network);

        Ok(ProcessSnapshot {
            pid,
            timestamp,
            name: self.read_name(&proc_dir, &stat),
            cpu_ticks: stat.cpu_ticks(),
            system_cpu_ticks,
            rss_bytes,
            io_read_bytes,
            io_write_bytes,
            net_rx_bytes,
            net_tx_bytes,
            alive: true,
        })
    }

    fn read_stat(&self, pid: u32, proc_dir: &str) -> Result<ProcStat, ReadError> {
        let path = PathBuf::from(format!("{}/stat", proc_dir));
        let content = self.read_process_file(pid, path)?;
        parse_proc_stat(&content).map_err(|e| ReadError::MalformedData {
            pid,
            reason: e.message,
        })
    }

    fn read_system_cpu_ticks(&self, pid: u32) -> Result<u64, ReadError> {
        let path = PathBuf::from(format!("{}/stat", self.proc_path));
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| ReadError::ReadFailure { path, source })?;
        parse_total_cpu_ticks(&content).map_err(|e| ReadError::MalformedData {
            pid,
            reason: e.message,
        })
    }

    fn read_rss_bytes(&self, pid: u32, proc_dir: &str) -> Result<u64, ReadError> {
        let path = PathBuf::from(format!("{}/status", proc_dir));
        let content = self.read_process_file(pid, path)?;
        let status = parse_proc_status(&content).map_err(|e| ReadError::MalformedData {
            pid,
            reason: e.message,
        })?;
        Ok(status.vm_rss_kb.saturating_mul(1024))
    }

    fn read_io(&self, pid: u32, proc_dir: &str) -> (u64, u64) {
        let path = format!("{}/io", proc_dir);
        match self.fs.read_to_string(Path::new(&path)) {
            Ok(content) => parse_proc_io(&content)
                .map(|io| (io.read_bytes, io.write_bytes))
                .unwrap_or_default(),
            Err(e) => {
                debug!(pid, path = %path, error = %e, "storage I/O counters unavailable");
                (0, 0)
            }
        }
    }

    fn read_network(&self, network: NetworkSource) -> (u64, u64) {
        match network {
            NetworkSource::System => {
                let path = format!("{}/net/dev", self.proc_path);
                match self.fs.read_to_string(Path::new(&path)) {
                    Ok(content) => parse_net_dev(&content)
                        .map(|devices| {
                            devices.iter().fold((0u64, 0u64), |(rx, tx), dev| {
                                (rx.saturating_add(dev.rx_bytes), tx.saturating_add(dev.tx_bytes))
                            })
                        })
                        .unwrap_or_default(),
                    Err(e) => {
                        debug!(path = %path, error = %e, "network counters unavailable");
                        (0, 0)
                    }
                }
            }
            NetworkSource::Owner(uid) => {
                let path = format!("{}/net/xt_qtaguid/stats", self.proc_path);
                match self.fs.read_to_string(Path::new(&path)) {
                    Ok(content) => parse_qtaguid_stats(&content, uid).unwrap_or_else(|e| {
                        debug!(uid, error = %e, "unparseable per-uid network counters");
                        (0, 0)
                    }),
                    Err(e) => {
                        debug!(uid, path = %path, error = %e, "per-uid network counters unsupported");
                        (0, 0)
                    }
                }
            }
        }
    }

    fn read_name(&self, proc_dir: &str, stat: &ProcStat) -> String {
        let comm_path = format!("{}/comm", proc_dir);
        let name = self
            .fs
            .read_to_string(Path::new(&comm_path))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| stat.comm.clone());
        if name.is_empty() {
            "unknown".to_string()
        } else {
            name
        }
    }

    /// Reads a mandatory per-process file, mapping a missing file to
    /// [`ReadError::ProcessNotFound`].
    fn read_process_file(&self, pid: u32, path: PathBuf) -> Result<String, ReadError> {
        self.fs.read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ReadError::ProcessNotFound { pid }
            } else {
                ReadError::ReadFailure { path, source }
            }
        })
    }
}

impl<F: FileSystem + 'static> SnapshotSource for SnapshotReader<F> {
    fn read_snapshot(&self, pid: u32, owner: Option<u32>) -> Result<ProcessSnapshot, ReadError> {
        self.read(pid, NetworkSource::from_owner(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_read_typical_process() {
        let reader = SnapshotReader::new(MockFs::typical_system(), "/proc");

        let snap = reader.read(1000, NetworkSource::System).unwrap();

        assert_eq!(snap.pid, 1000);
        assert_eq!(snap.name, "bash");
        assert_eq!(snap.cpu_ticks, 150);
        assert_eq!(snap.system_cpu_ticks, 94_800);
        assert_eq!(snap.rss_bytes, 8000 * 1024);
        assert_eq!(snap.io_read_bytes, 100_000);
        assert_eq!(snap.io_write_bytes, 50_000);
        // lo + eth0
        assert_eq!(snap.net_rx_bytes, 12_345_678 + 987_654_321);
        assert_eq!(snap.net_tx_bytes, 12_345_678 + 123_456_789);
        assert!(snap.alive);
    }

    #[test]
    fn test_missing_process_is_not_found() {
        let reader = SnapshotReader::new(MockFs::typical_system(), "/proc");

        let err = reader.read(4242, NetworkSource::System).unwrap_err();

        assert!(matches!(err, ReadError::ProcessNotFound { pid: 4242 }));
        assert!(err.is_process_gone());
    }

    #[test]
    fn test_status_vanishing_mid_read_is_not_found() {
        let mut fs = MockFs::typical_system();
        fs.remove_file("/proc/1000/status");
        let reader = SnapshotReader::new(fs, "/proc");

        let err = reader.read(1000, NetworkSource::System).unwrap_err();
        assert!(err.is_process_gone());
    }

    #[test]
    fn test_truncated_stat_is_malformed() {
        let fs = MockFs::with_malformed_stat(2000);
        let reader = SnapshotReader::new(fs, "/proc");

        let err = reader.read(2000, NetworkSource::System).unwrap_err();
        assert!(matches!(err, ReadError::MalformedData { pid: 2000, .. }));
    }

    #[test]
    fn test_unreadable_stat_is_read_failure() {
        let mut fs = MockFs::typical_system();
        fs.remove_file("/proc/1000/stat");
        fs.deny("/proc/1000/stat");
        let reader = SnapshotReader::new(fs, "/proc");

        let err = reader.read(1000, NetworkSource::System).unwrap_err();
        assert!(matches!(err, ReadError::ReadFailure { .. }));
        assert!(!err.is_process_gone());
    }

    #[test]
    fn test_missing_system_stat_is_read_failure() {
        let mut fs = MockFs::typical_system();
        fs.remove_file("/proc/stat");
        let reader = SnapshotReader::new(fs, "/proc");

        let err = reader.read(1000, NetworkSource::System).unwrap_err();
        assert!(matches!(err, ReadError::ReadFailure { .. }));
    }

    #[test]
    fn test_missing_vmrss_reads_zero() {
        let fs = MockFs::with_zombie_process();
        let reader = SnapshotReader::new(fs, "/proc");

        let snap = reader.read(4000, NetworkSource::System).unwrap();
        assert_eq!(snap.rss_bytes, 0);
    }

    #[test]
    fn test_optional_counters_default_to_zero() {
        let mut fs = MockFs::typical_system();
        fs.deny("/proc/1000/io");
        fs.remove_file("/proc/net/dev");
        let reader = SnapshotReader::new(fs, "/proc");

        let snap = reader.read(1000, NetworkSource::System).unwrap();

        assert_eq!((snap.io_read_bytes, snap.io_write_bytes), (0, 0));
        assert_eq!((snap.net_rx_bytes, snap.net_tx_bytes), (0, 0));
        assert_eq!(snap.cpu_ticks, 150);
    }

    #[test]
    fn test_owner_network_counters() {
        let fs = MockFs::with_qtaguid();
        let reader = SnapshotReader::new(fs, "/proc");

        let snap = reader.read(1001, NetworkSource::Owner(10123)).unwrap();
        assert_eq!((snap.net_rx_bytes, snap.net_tx_bytes), (1550, 525));
    }

    #[test]
    fn test_owner_network_unsupported_reads_zero() {
        let reader = SnapshotReader::new(MockFs::typical_system(), "/proc");

        let snap = reader.read(1000, NetworkSource::Owner(1000)).unwrap();
        assert_eq!((snap.net_rx_bytes, snap.net_tx_bytes), (0, 0));
    }

    #[test]
    fn test_name_falls_back_to_stat_comm() {
        let mut fs = MockFs::typical_system();
        fs.remove_file("/proc/1000/comm");
        let reader = SnapshotReader::new(fs, "/proc");

        assert_eq!(reader.read(1000, NetworkSource::System).unwrap().name, "bash");
    }

    #[test]
    fn test_custom_proc_path() {
        let mut fs = MockFs::new();
        fs.add_file("/captured/stat", "cpu 1 1 1 1 0 0 0 0\n");
        fs.add_file(
            "/captured/5/stat",
            "5 (svc) S 1 5 5 0 -1 0 0 0 0 0 3 4 0 0 20 0 1 0 10 0 0",
        );
        fs.add_file("/captured/5/status", "Name:\tsvc\nVmRSS:\t1 kB\n");
        let reader = SnapshotReader::new(fs, "/captured");

        let snap = reader.read(5, NetworkSource::System).unwrap();

        assert_eq!(snap.name, "svc");
        assert_eq!(snap.cpu_ticks, 7);
        assert_eq!(snap.system_cpu_ticks, 4);
        assert_eq!(snap.rss_bytes, 1024);
    }

    #[test]
    fn test_snapshot_source_uses_owner() {
        let reader = SnapshotReader::new(MockFs::with_qtaguid(), "/proc");
        let source: &dyn SnapshotSource = &reader;

        let system = source.read_snapshot(1001, None).unwrap();
        let owned = source.read_snapshot(1001, Some(10123)).unwrap();

        assert!(system.net_rx_bytes > owned.net_rx_bytes);
        assert_eq!(owned.net_rx_bytes, 1550);
    }
}
