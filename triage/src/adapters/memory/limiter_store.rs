//! In-memory fixed-window counter store
//!
//! Shared by every limiter in the process. Windows are measured with
//! `tokio::time::Instant` so paused-clock tests can drive them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::ports::{LimiterStore, WindowSnapshot};
use crate::error::DomainError;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

impl Window {
    fn is_open(&self, now: Instant) -> bool {
        now < self.resets_at
    }
}

/// Process-wide limiter store guarded by a mutex
#[derive(Debug, Default)]
pub struct InMemoryLimiterStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryLimiterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Window>>, DomainError> {
        self.windows
            .lock()
            .map_err(|_| DomainError::Internal("limiter store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LimiterStore for InMemoryLimiterStore {
    async fn try_hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<Option<u32>, DomainError> {
        let now = Instant::now();
        let mut windows = self.lock()?;

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + window,
        });
        if !entry.is_open(now) {
            *entry = Window {
                count: 0,
                resets_at: now + window,
            };
        }

        if entry.count >= limit {
            return Ok(None);
        }
        entry.count += 1;
        Ok(Some(entry.count))
    }

    async fn window(&self, key: &str) -> Result<Option<WindowSnapshot>, DomainError> {
        let now = Instant::now();
        let windows = self.lock()?;

        Ok(windows
            .get(key)
            .filter(|w| w.is_open(now))
            .map(|w| WindowSnapshot {
                count: w.count,
                resets_in: w.resets_at - now,
            }))
    }

    async fn clear(&self, key: &str) -> Result<(), DomainError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
