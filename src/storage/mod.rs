//! In-memory storage of sampled resource usage.
//!
//! - `model`: snapshot and result record types
//! - `history`: bounded, thread-safe FIFO of result records

pub mod history;
pub mod model;

pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryStore};
pub use model::{ProcessSnapshot, ResourceRecord};
