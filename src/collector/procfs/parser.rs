//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of `/proc` files into
//! structured data. They never touch the filesystem, so they are tested
//! with string inputs.

use std::collections::HashMap;

/// Minimum number of fields after the `(comm)` field of `/proc/[pid]/stat`.
///
/// `utime` and `stime` sit at offsets 11 and 12 of that tail.
pub const MIN_STAT_FIELDS: usize = 13;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Parsed data from `/proc/[pid]/stat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStat {
    pub comm: String,
    /// Time scheduled in user mode, in clock ticks.
    pub utime: u64,
    /// Time scheduled in kernel mode, in clock ticks.
    pub stime: u64,
}

impl ProcStat {
    /// Cumulative CPU ticks consumed by the process (user + kernel).
    pub fn cpu_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Parses `/proc/[pid]/stat` content.
///
/// The comm field can contain spaces and parentheses, so it is delimited by
/// the first `(` and the last `)`.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    content[..open_paren]
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::new("invalid pid"))?;

    let comm = content[open_paren + 1..close_paren].to_string();

    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();

    if fields.len() < MIN_STAT_FIELDS {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected {}+, got {}",
            MIN_STAT_FIELDS,
            fields.len()
        )));
    }

    let parse_u64 = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ProcStat {
        comm,
        utime: parse_u64(11, "utime")?,
        stime: parse_u64(12, "stime")?,
    })
}

/// Parsed data from `/proc/[pid]/status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStatus {
    /// Resident set size in kB. Zero when the kernel omits `VmRSS`
    /// (kernel threads, zombies).
    pub vm_rss_kb: u64,
}

/// Parses `/proc/[pid]/status` content.
///
/// Format is key:\tvalue pairs, one per line.
pub fn parse_proc_status(content: &str) -> Result<ProcStatus, ParseError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim(), value.trim());
        }
    }

    if fields.is_empty() {
        return Err(ParseError::new("empty status"));
    }

    let vm_rss_kb = fields
        .get("VmRSS")
        .and_then(|s| s.split_whitespace().next())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Ok(ProcStatus { vm_rss_kb })
}

/// Parsed data from `/proc/[pid]/io`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcIo {
    /// Bytes fetched from the storage layer.
    pub read_bytes: u64,
    /// Bytes sent to the storage layer.
    pub write_bytes: u64,
}

/// Parses `/proc/[pid]/io` content.
pub fn parse_proc_io(content: &str) -> Result<ProcIo, ParseError> {
    let mut io = ProcIo::default();

    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let value: u64 = value.trim().parse().unwrap_or(0);
            match key.trim() {
                "read_bytes" => io.read_bytes = value,
                "write_bytes" => io.write_bytes = value,
                _ => {}
            }
        }
    }

    Ok(io)
}

/// Parses the aggregate `cpu` line of `/proc/stat` into total CPU ticks.
///
/// The total is the sum of user, nice, system, idle, iowait, irq, softirq
/// and steal. Guest time is already folded into user/nice by the kernel
/// and is not added again.
pub fn parse_total_cpu_ticks(content: &str) -> Result<u64, ParseError> {
    let line = content
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| ParseError::new("missing aggregate cpu line in stat"))?;

    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|s| s.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ParseError::new("invalid value in cpu line"))?;

    if values.len() < 4 {
        return Err(ParseError::new(format!(
            "not enough fields in cpu line: expected 4+, got {}",
            values.len()
        )));
    }

    Ok(values.iter().fold(0u64, |acc, v| acc.saturating_add(*v)))
}

/// Byte counters for one network interface from `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetDevStats {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Parses `/proc/net/dev` content.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevStats>, ParseError> {
    let mut devices = Vec::new();

    for line in content.lines() {
        if line.contains('|') || line.trim().is_empty() {
            continue;
        }

        let Some((_, counters)) = line.split_once(':') else {
            continue;
        };
        let values: Vec<&str> = counters.split_whitespace().collect();
        if values.len() < 9 {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { values.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        devices.push(NetDevStats {
            rx_bytes: get_val(0),
            tx_bytes: get_val(8),
        });
    }

    Ok(devices)
}

/// Sums rx/tx bytes of `uid` from `/proc/net/xt_qtaguid/stats`.
///
/// Only rows with `acct_tag_hex == 0x0` are counted: tagged rows are
/// sub-totals of the untagged one and would double count.
///
/// Format:
/// idx iface acct_tag_hex uid_tag_int cnt_set rx_bytes rx_packets tx_bytes tx_packets ...
pub fn parse_qtaguid_stats(content: &str, uid: u32) -> Result<(u64, u64), ParseError> {
    let mut lines = content.lines();
    let header = lines
        .next()
        .ok_or_else(|| ParseError::new("empty qtaguid stats"))?;
    if !header.starts_with("idx") {
        return Err(ParseError::new("missing qtaguid header"));
    }

    let mut rx = 0u64;
    let mut tx = 0u64;
    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 8 || parts[2] != "0x0" {
            continue;
        }
        if parts[3].parse::<u32>().ok() != Some(uid) {
            continue;
        }
        rx = rx.saturating_add(parts[5].parse().unwrap_or(0));
        tx = tx.saturating_add(parts[7].parse().unwrap_or(0));
    }

    Ok((rx, tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_stat_basic() {
        let content = "1234 (bash) S 1233 1234 1234 34816 1235 4194304 5000 50000 10 20 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 5 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.comm, "bash");
        assert_eq!(stat.utime, 100);
        assert_eq!(stat.stime, 50);
        assert_eq!(stat.cpu_ticks(), 150);
    }

    #[test]
    fn test_parse_proc_stat_with_spaces_in_comm() {
        let content = "5000 (Web Content) S 4999 5000 4999 0 -1 4194304 100000 0 500 0 5000 1000 0 0 20 0 20 0 500000 2000000000 50000";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.comm, "Web Content");
        assert_eq!(stat.cpu_ticks(), 6000);
    }

    #[test]
    fn test_parse_proc_stat_with_parentheses_in_comm() {
        let content = "5001 (test(1)) S 1 5001 5001 0 -1 4194304 1000 0 0 0 10 5 0 0 20 0 1 0 500100 10000000 1000";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.comm, "test(1)");
        assert_eq!(stat.utime, 10);
        assert_eq!(stat.stime, 5);
    }

    #[test]
    fn test_parse_proc_stat_minimal_fields() {
        // Exactly up to stime.
        let content = "77 (short) R 1 77 77 0 -1 0 0 0 0 0 30 12";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.cpu_ticks(), 42);
    }

    #[test]
    fn test_parse_proc_stat_truncated() {
        let err = parse_proc_stat("77 (short) R 1 77 77 0 -1 0 0 0 0 0 30").unwrap_err();
        assert!(err.message.contains("not enough fields"));
    }

    #[test]
    fn test_parse_proc_stat_garbage() {
        assert!(parse_proc_stat("").is_err());
        assert!(parse_proc_stat("no parens here").is_err());
        assert!(parse_proc_stat("x (a) S 1 1 1 0 -1 0 0 0 0 0 1 1").is_err());
        assert!(parse_proc_stat("9 (a) S 1 1 1 0 -1 0 0 0 0 0 abc 1").is_err());
    }

    #[test]
    fn test_parse_proc_status() {
        let content = "\
Name:\tbash
Pid:\t1234
PPid:\t1233
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
VmPeak:\t   30000 kB
VmSize:\t   25000 kB
VmRSS:\t    8000 kB
voluntary_ctxt_switches:\t500
";
        let status = parse_proc_status(content).unwrap();

        assert_eq!(status.vm_rss_kb, 8000);
    }

    #[test]
    fn test_parse_proc_status_without_vmrss() {
        let content = "Name:\tkthreadd\nPid:\t2\nUid:\t0\t0\t0\t0\n";
        let status = parse_proc_status(content).unwrap();

        assert_eq!(status.vm_rss_kb, 0);
    }

    #[test]
    fn test_parse_proc_status_empty() {
        assert!(parse_proc_status("").is_err());
    }

    #[test]
    fn test_parse_proc_io() {
        let content = "rchar: 1000000\nwchar: 500000\nsyscr: 5000\nsyscw: 2500\nread_bytes: 100000\nwrite_bytes: 50000\ncancelled_write_bytes: 0\n";
        let io = parse_proc_io(content).unwrap();

        assert_eq!(io.read_bytes, 100000);
        assert_eq!(io.write_bytes, 50000);
    }

    #[test]
    fn test_parse_total_cpu_ticks() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 700 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
ctxt 500000
btime 1700000000
";
        // guest (700) is excluded from the total
        assert_eq!(parse_total_cpu_ticks(content).unwrap(), 94800);
    }

    #[test]
    fn test_parse_total_cpu_ticks_old_kernel() {
        // Pre-2.6 kernels only report four columns.
        assert_eq!(parse_total_cpu_ticks("cpu 1 2 3 4\n").unwrap(), 10);
    }

    #[test]
    fn test_parse_total_cpu_ticks_malformed() {
        assert!(parse_total_cpu_ticks("cpu0 1 2 3 4\n").is_err());
        assert!(parse_total_cpu_ticks("cpu 1 2\n").is_err());
        assert!(parse_total_cpu_ticks("cpu 1 x 3 4\n").is_err());
    }

    #[test]
    fn test_parse_net_dev() {
        let content = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
";
        let devices = parse_net_dev(content).unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].rx_bytes, 12345678);
        assert_eq!(devices[1].rx_bytes, 987654321);
        assert_eq!(devices[1].tx_bytes, 123456789);
    }

    #[test]
    fn test_parse_net_dev_without_space_after_colon() {
        let content = "  eth1:1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0\n";
        let devices = parse_net_dev(content).unwrap();

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].rx_bytes, 1000);
        assert_eq!(devices[0].tx_bytes, 2000);
    }

    #[test]
    fn test_parse_qtaguid_stats() {
        let content = "\
idx iface acct_tag_hex uid_tag_int cnt_set rx_bytes rx_packets tx_bytes tx_packets
2 wlan0 0x0 10123 0 1000 10 400 4
3 wlan0 0x0 10123 1 500 5 100 1
4 wlan0 0x2a00000000 10123 0 900 9 300 3
5 wlan0 0x0 10124 0 7777 7 8888 8
6 rmnet0 0x0 10123 0 50 1 25 1
";
        assert_eq!(parse_qtaguid_stats(content, 10123).unwrap(), (1550, 525));
        assert_eq!(parse_qtaguid_stats(content, 10124).unwrap(), (7777, 8888));
        assert_eq!(parse_qtaguid_stats(content, 1).unwrap(), (0, 0));
    }

    #[test]
    fn test_parse_qtaguid_stats_bad_header() {
        assert!(parse_qtaguid_stats("", 1).is_err());
        assert!(parse_qtaguid_stats("garbage\n", 1).is_err());
    }
}
