//! Finding processes to monitor by name.

use std::io;
use std::path::Path;

use tracing::trace;

use crate::collector::traits::FileSystem;

/// Returns the pids whose `comm` equals `name` exactly, sorted ascending.
///
/// Processes that exit while the directory is being scanned are skipped.
pub fn find_processes_by_name<F: FileSystem>(
    fs: &F,
    proc_path: &str,
    name: &str,
) -> io::Result<Vec<u32>> {
    let mut pids = Vec::new();

    for entry in fs.read_dir(Path::new(proc_path))? {
        let Some(pid) = entry
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };

        match fs.read_to_string(&entry.join("comm")) {
            Ok(comm) if comm.trim() == name => pids.push(pid),
            Ok(_) => {}
            Err(e) => trace!(pid, error = %e, "skipping process during discovery"),
        }
    }

    pids.sort_unstable();
    Ok(pids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_find_by_exact_name() {
        let fs = MockFs::with_duplicate_names();

        let pids = find_processes_by_name(&fs, "/proc", "termux").unwrap();

        // termux-x11 (1600) is not an exact match
        assert_eq!(pids, vec![1001, 1500]);
    }

    #[test]
    fn test_find_nothing() {
        let fs = MockFs::typical_system();
        assert!(find_processes_by_name(&fs, "/proc", "nginx").unwrap().is_empty());
    }

    #[test]
    fn test_skips_non_pid_entries() {
        let fs = MockFs::typical_system();
        // /proc/net and /proc/stat must not be mistaken for processes
        let pids = find_processes_by_name(&fs, "/proc", "bash").unwrap();
        assert_eq!(pids, vec![1000]);
    }

    #[test]
    fn test_missing_proc_dir() {
        let fs = MockFs::new();
        assert!(find_processes_by_name(&fs, "/proc", "bash").is_err());
    }
}
