//! Mock filesystem implementations for testing.
//!
//! This module provides `MockFs` and pre-built scenarios for exercising the
//! snapshot reader without a Linux `/proc` filesystem.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
