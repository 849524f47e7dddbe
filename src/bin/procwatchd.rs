//! procwatchd - per-process resource sampler daemon.
//!
//! Samples one process from /proc, keeps a bounded history of the results
//! and serves it over HTTP until interrupted.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::net::{AddrParseError, SocketAddr};
use std::num::NonZeroUsize;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
use procwatch::collector::RealFs;
#[cfg(not(target_os = "linux"))]
use procwatch::collector::mock::MockFs;
use procwatch::collector::{FileSystem, SnapshotReader, find_processes_by_name};
use procwatch::monitor::{Cadence, LoggingObserver, SamplingConfig, Scheduler, StartOutcome};
use procwatch::storage::HistoryStore;

/// Per-process resource sampler.
#[derive(Parser, Debug)]
#[command(name = "procwatchd", about = "Per-process resource sampler", version = procwatch::VERSION)]
struct Args {
    /// Pid to monitor. When unset, the process is looked up by name.
    #[arg(long, env = "MONITOR_PID")]
    pid: Option<i32>,

    /// Exact process name to look up when no pid is given.
    #[arg(long, default_value = "termux", env = "MONITOR_PROCESS_NAME")]
    process_name: String,

    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:8080", env = "MONITOR_LISTEN")]
    listen: String,

    /// Overrides the port of the listen address.
    #[arg(long, env = "MONITOR_PORT")]
    port: Option<u16>,

    /// Sampling interval in seconds while the process is active.
    #[arg(short, long, default_value = "5", env = "MONITOR_INTERVAL")]
    interval: u64,

    /// Sampling interval in seconds while the process is idle.
    #[arg(long, default_value = "30", env = "MONITOR_IDLE_INTERVAL")]
    idle_interval: u64,

    /// Combined network bytes/sec below which the process counts as idle.
    #[arg(long, default_value = "1024", env = "MONITOR_IDLE_THRESHOLD")]
    idle_threshold: f64,

    /// Always sample at --interval, ignoring network activity.
    #[arg(long)]
    fixed_interval: bool,

    /// Consecutive failed reads before the process is declared dead.
    #[arg(long, default_value = "3", env = "MONITOR_FAILURE_THRESHOLD")]
    failure_threshold: u32,

    /// Number of records kept in memory (at least 1).
    #[arg(long, default_value = "1000", env = "MONITOR_HISTORY")]
    history: NonZeroUsize,

    /// Attribute network traffic to this uid (Android xt_qtaguid) instead of
    /// the whole host.
    #[arg(long, env = "MONITOR_OWNER_UID")]
    owner_uid: Option<u32>,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn sampling_config(&self) -> SamplingConfig {
        SamplingConfig {
            interval: Duration::from_secs(self.interval),
            idle_interval: Duration::from_secs(self.idle_interval),
            idle_threshold: self.idle_threshold,
            failure_threshold: self.failure_threshold,
            cadence: if self.fixed_interval {
                Cadence::Fixed
            } else {
                Cadence::Adaptive
            },
        }
    }
}

/// Resolves the bind address, with `port` taking precedence over the port
/// in `listen`.
fn listen_addr(listen: &str, port: Option<u16>) -> Result<SocketAddr, AddrParseError> {
    let mut addr: SocketAddr = listen.parse()?;
    if let Some(port) = port {
        addr.set_port(port);
    }
    Ok(addr)
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["procwatchd", "procwatch"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    if verbose > 0 {
        if let Ok(directive) = format!("tower_http={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    #[cfg(target_os = "linux")]
    let fs = RealFs::new();
    #[cfg(not(target_os = "linux"))]
    let fs = {
        warn!("not running on Linux, sampling a simulated /proc");
        MockFs::typical_system()
    };

    if let Err(message) = runtime.block_on(run(args, fs)) {
        error!("{message}");
        process::exit(1);
    }
}

/// Picks the pid to monitor: `--pid` if given, otherwise the lowest pid
/// named `--process-name`.
fn resolve_pid<F: FileSystem>(args: &Args, fs: &F) -> Result<i32, String> {
    if let Some(pid) = args.pid {
        return Ok(pid);
    }

    let pids = find_processes_by_name(fs, &args.proc_path, &args.process_name)
        .map_err(|e| format!("failed to scan {}: {e}", args.proc_path))?;
    let Some(&pid) = pids.first() else {
        return Err(format!(
            "no process named '{}' found, set MONITOR_PID to pick one explicitly",
            args.process_name
        ));
    };
    if pids.len() > 1 {
        warn!(name = %args.process_name, ?pids, pid, "several processes match, monitoring the first");
    }
    i32::try_from(pid).map_err(|_| format!("pid {pid} out of range"))
}

async fn run<F: FileSystem + 'static>(args: Args, fs: F) -> Result<(), String> {
    let addr = listen_addr(&args.listen, args.port)
        .map_err(|e| format!("invalid listen address '{}': {e}", args.listen))?;
    let pid = resolve_pid(&args, &fs)?;
    let config = args.sampling_config();

    info!(
        version = procwatch::VERSION,
        pid,
        interval_secs = args.interval,
        idle_interval_secs = args.idle_interval,
        idle_threshold = args.idle_threshold,
        fixed = args.fixed_interval,
        history = args.history.get(),
        "starting procwatchd"
    );

    let history = Arc::new(HistoryStore::new(args.history.get()));
    let scheduler = Scheduler::new(SnapshotReader::new(fs, &args.proc_path), Arc::clone(&history));
    scheduler.add_observer(Arc::new(LoggingObserver));

    match scheduler.start(pid, args.owner_uid, config) {
        Ok(StartOutcome::Started) => {}
        Ok(StartOutcome::AlreadyMonitoring) => warn!(pid, "already monitoring"),
        Err(e) => return Err(format!("cannot monitor pid {pid}: {e}")),
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;
    info!(%addr, "listening");

    let served = axum::serve(listener, procwatch::api::router(history))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.stop_all();
    info!("procwatchd stopped");
    served.map_err(|e| format!("server error: {e}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
