//! Per-process metrics collection for Linux.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               SnapshotReader                 │
//! │  - /proc/[pid]/stat, status, io, comm        │
//! │  - /proc/stat, /proc/net/dev                 │
//! │  - /proc/net/xt_qtaguid/stats (per uid)      │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                 ┌──────▼──────┐
//!                 │  FileSystem │ (trait)
//!                 └──────┬──────┘
//!              ┌─────────┴─────────┐
//!       ┌──────▼──────┐     ┌──────▼──────┐
//!       │   RealFs    │     │   MockFs    │
//!       │ (Linux)     │     │ (Testing)   │
//!       └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use procwatch::collector::{MockFs, NetworkSource, SnapshotReader};
//!
//! let reader = SnapshotReader::new(MockFs::typical_system(), "/proc");
//! let snapshot = reader.read(1000, NetworkSource::System).unwrap();
//! assert_eq!(snapshot.name, "bash");
//! ```

pub mod discovery;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use discovery::find_processes_by_name;
pub use mock::MockFs;
pub use procfs::{NetworkSource, ReadError, SnapshotReader};
pub use traits::{FileSystem, RealFs, SnapshotSource};
