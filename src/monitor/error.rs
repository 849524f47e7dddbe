//! Errors returned synchronously by the scheduler API.

/// Error type for scheduler operations.
///
/// Per-tick read failures never surface here: they are reported to
/// observers as `monitor_error` or `process_died`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("monitoring requires a running Tokio runtime")]
    NoRuntime,
}
