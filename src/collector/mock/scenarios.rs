//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` states for the snapshot reader
//! and process discovery.

use super::filesystem::MockFs;

const BASH_STATUS: &str = "\
Name:\tbash
Pid:\t1000
PPid:\t999
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
VmPeak:\t   30000 kB
VmSize:\t   25000 kB
VmRSS:\t    8000 kB
VmData:\t    2000 kB
voluntary_ctxt_switches:\t500
nonvoluntary_ctxt_switches:\t50
";

impl MockFs {
    /// Creates a typical system with a few processes.
    ///
    /// Includes: init (PID 1), a bash shell (PID 1000) and a termux session
    /// (PID 1001), plus `/proc/stat` and `/proc/net/dev`.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
",
        );

        // PID 1 - init/systemd
        fs.add_process(
            1,
            "1 (systemd) S 0 1 1 0 -1 4194560 50000 1000000 100 500 1000 500 2000 1000 20 0 1 0 1 170000000 3000 18446744073709551615 0 0 0 0 0 0 0 0 1073745152 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tsystemd
Pid:\t1
PPid:\t0
Uid:\t0\t0\t0\t0
Gid:\t0\t0\t0\t0
VmRSS:\t    12000 kB
",
            "rchar: 100000000\nwchar: 50000000\nsyscr: 50000\nsyscw: 25000\nread_bytes: 10000000\nwrite_bytes: 5000000\ncancelled_write_bytes: 0\n",
            "systemd\n",
        );

        // PID 1000 - bash shell
        fs.add_process(
            1000,
            "1000 (bash) S 999 1000 1000 34816 1001 4194304 5000 50000 0 0 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 0 0 0 0 0 0 0 0 0 0 0",
            BASH_STATUS,
            "rchar: 1000000\nwchar: 500000\nsyscr: 5000\nsyscw: 2500\nread_bytes: 100000\nwrite_bytes: 50000\ncancelled_write_bytes: 0\n",
            "bash\n",
        );

        // PID 1001 - termux session, /proc/[pid]/io not readable
        fs.add_process(
            1001,
            "1001 (termux) S 1 1001 1001 0 -1 4194304 20000 0 0 0 4000 1000 0 0 20 0 12 0 200000 900000000 30000",
            "\
Name:\ttermux
Pid:\t1001
PPid:\t1
Uid:\t10123\t10123\t10123\t10123
VmRSS:\t  120000 kB
",
            "",
            "termux\n",
        );

        fs
    }

    /// Typical system plus PID 2000 whose stat is cut short before `utime`.
    pub fn with_malformed_stat(pid: u32) -> Self {
        let mut fs = Self::typical_system();
        fs.add_process(
            pid,
            &format!("{} (broken) S 1 {} {} 0 -1", pid, pid, pid),
            "Name:\tbroken\nVmRSS:\t100 kB\n",
            "",
            "broken\n",
        );
        fs
    }

    /// Typical system plus a zombie (PID 4000) whose status has no `VmRSS`.
    pub fn with_zombie_process() -> Self {
        let mut fs = Self::typical_system();
        fs.add_process(
            4000,
            "4000 (defunct) Z 1000 4000 1000 0 -1 4194308 0 0 0 0 0 0 0 0 20 0 1 0 400000 0 0 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 -1 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "Name:\tdefunct\nState:\tZ (zombie)\nPid:\t4000\nPPid:\t1000\nUid:\t1000\t1000\t1000\t1000\n",
            "",
            "defunct\n",
        );
        fs
    }

    /// Typical system on an Android kernel exposing per-uid traffic.
    pub fn with_qtaguid() -> Self {
        let mut fs = Self::typical_system();
        fs.add_file(
            "/proc/net/xt_qtaguid/stats",
            "\
idx iface acct_tag_hex uid_tag_int cnt_set rx_bytes rx_packets tx_bytes tx_packets rx_tcp_bytes rx_tcp_packets
2 wlan0 0x0 10123 0 1000 10 400 4 1000 10
3 wlan0 0x0 10123 1 500 5 100 1 500 5
4 wlan0 0x2a00000000 10123 0 900 9 300 3 900 9
5 wlan0 0x0 10124 0 7777 7 8888 8 7777 7
6 rmnet0 0x0 10123 0 50 1 25 1 50 1
",
        );
        fs
    }

    /// Two processes sharing the `termux` name, used by discovery tests.
    pub fn with_duplicate_names() -> Self {
        let mut fs = Self::typical_system();
        fs.add_process(
            1500,
            "1500 (termux) S 1 1500 1500 0 -1 4194304 0 0 0 0 10 10 0 0 20 0 1 0 300000 0 0",
            "Name:\ttermux\nUid:\t10123\t10123\t10123\t10123\nVmRSS:\t1000 kB\n",
            "",
            "termux\n",
        );
        fs.add_process(
            1600,
            "1600 (termux-x11) S 1 1600 1600 0 -1 4194304 0 0 0 0 10 10 0 0 20 0 1 0 300000 0 0",
            "Name:\ttermux-x11\nVmRSS:\t1000 kB\n",
            "",
            "termux-x11\n",
        );
        fs
    }
}
