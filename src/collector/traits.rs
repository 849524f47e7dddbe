//! Filesystem access abstraction for the `/proc` readers.
//!
//! Readers are generic over [`FileSystem`] so they can run against the live
//! `/proc` tree on Linux, against a captured copy on disk, or against the
//! in-memory [`MockFs`](crate::collector::MockFs) in tests.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collector::procfs::ReadError;
use crate::storage::model::ProcessSnapshot;

/// Source of per-process snapshots consumed by the sampling scheduler.
///
/// [`SnapshotReader`](crate::collector::SnapshotReader) is the production
/// implementation; tests script their own sequences of snapshots and errors.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Reads the current counters of `pid`. `owner` selects per-uid network
    /// attribution when the platform supports it.
    fn read_snapshot(&self, pid: u32, owner: Option<u32>) -> Result<ProcessSnapshot, ReadError>;
}

impl<T: SnapshotSource> SnapshotSource for Arc<T> {
    fn read_snapshot(&self, pid: u32, owner: Option<u32>) -> Result<ProcessSnapshot, ReadError> {
        (**self).read_snapshot(pid, owner)
    }
}

/// Read-only view of a filesystem.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// A missing file must be reported with [`io::ErrorKind::NotFound`]:
    /// the snapshot reader relies on that kind to tell a dead process
    /// apart from a transient read failure.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Lists the direct children of a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}
