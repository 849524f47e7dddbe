//! Readers for the Linux `/proc` filesystem.
//!
//! `parser` holds pure parsers over file contents; `reader` turns them into
//! [`ProcessSnapshot`](crate::storage::model::ProcessSnapshot)s through a
//! [`FileSystem`](crate::collector::FileSystem).

pub mod parser;
pub mod reader;

pub use parser::ParseError;
pub use reader::{NetworkSource, ReadError, SnapshotReader};
