//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Manual mocks instead of mockall: the port traits take `&str` and borrowed
//! ids, and hand-written mocks let tests inject failures per call.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
