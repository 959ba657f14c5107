//! Rate limiter storage port
//!
//! Fixed-window hit counters keyed by limiter name. Implementations must make
//! `try_hit` atomic per key so concurrent callers never overshoot the limit.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DomainError;

/// State of an open window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Hits counted in this window
    pub count: u32,
    /// Time until the window closes and the count drops to zero
    pub resets_in: Duration,
}

#[async_trait]
pub trait LimiterStore: Send + Sync {
    /// Count one hit if the current window has room
    ///
    /// Opens a new window of length `window` when none is open. Returns the
    /// count after the hit, or `None` when the window is already at `limit`.
    async fn try_hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<Option<u32>, DomainError>;

    /// The open window for `key`, or `None` if it never opened or has expired
    async fn window(&self, key: &str) -> Result<Option<WindowSnapshot>, DomainError>;

    /// Drop the window for `key`
    async fn clear(&self, key: &str) -> Result<(), DomainError>;
}
