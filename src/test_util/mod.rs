//! Utilities for testing code built on the sending path. They are used by
//!  this crate's own tests and exported for application testing.

pub mod reader;
pub mod transport;
