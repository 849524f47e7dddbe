//! Data model shared by the reader, the rate calculator and the history store.

mod record;
mod snapshot;

pub use record::ResourceRecord;
pub use snapshot::ProcessSnapshot;
