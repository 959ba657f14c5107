//! In-process adapters
//!
//! Port implementations that keep their state in memory.

pub mod limiter_store;

pub use limiter_store::InMemoryLimiterStore;
