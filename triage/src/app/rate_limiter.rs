//! Rate limiter service
//!
//! Fixed-window request limiter for the completion API. The counter lives in
//! a `LimiterStore` keyed by limiter name, so every limiter built with the same
//! key and store shares one quota.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::app::job_config::{
    BACKOFF_MULTIPLIER, BULK_WINDOW_MINUTES, DEFAULT_DECAY_MINUTES, DEFAULT_RATE_LIMIT,
    MAX_BACKOFF, RATE_LIMIT_KEY,
};
use crate::domain::ports::LimiterStore;
use crate::error::DomainError;

/// Limiter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterConfig {
    /// Store key; limiters sharing a key share a counter
    pub key: String,
    /// Requests allowed per window
    pub limit: u32,
    /// Window length
    pub window: Duration,
    pub backoff_multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::with_limits(DEFAULT_RATE_LIMIT, DEFAULT_DECAY_MINUTES)
    }
}

impl LimiterConfig {
    /// `limit` requests per `decay_minutes`; both are floored at 1
    pub fn with_limits(limit: u32, decay_minutes: u32) -> Self {
        Self {
            key: RATE_LIMIT_KEY.to_string(),
            limit: limit.max(1),
            window: Duration::from_secs(60 * u64::from(decay_minutes.max(1))),
            backoff_multiplier: BACKOFF_MULTIPLIER,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// `limit` requests per minute
    pub fn per_minute(limit: u32) -> Self {
        Self::with_limits(limit, BULK_WINDOW_MINUTES)
    }

    /// 15 requests per minute
    #[allow(dead_code)]
    pub fn conservative() -> Self {
        Self::with_limits(15, 1)
    }

    /// 60 requests per minute
    #[allow(dead_code)]
    pub fn aggressive() -> Self {
        Self::with_limits(60, 1)
    }

    #[allow(dead_code)]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn decay_minutes(&self) -> u64 {
        self.window.as_secs() / 60
    }
}

/// Snapshot of a limiter, for logs and operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimiterStatus {
    pub can_make_request: bool,
    pub remaining_attempts: u32,
    pub attempts_made: u32,
    pub rate_limit: u32,
    pub available_in_seconds: u64,
    pub decay_minutes: u64,
}

/// Round a duration up to whole seconds
pub fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Fixed-window rate limiter
pub struct RateLimiter<S>
where
    S: LimiterStore,
{
    store: Arc<S>,
    config: LimiterConfig,
}

impl<S> RateLimiter<S>
where
    S: LimiterStore,
{
    pub fn new(store: Arc<S>, config: LimiterConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    pub fn rate_limit(&self) -> u32 {
        self.config.limit
    }

    /// Hits counted in the current window
    pub async fn attempts(&self) -> Result<u32, DomainError> {
        Ok(self
            .store
            .window(&self.config.key)
            .await?
            .map(|w| w.count)
            .unwrap_or(0))
    }

    /// Whether the current window still has room
    pub async fn can_make_request(&self) -> Result<bool, DomainError> {
        Ok(self.attempts().await? < self.config.limit)
    }

    pub async fn remaining_attempts(&self) -> Result<u32, DomainError> {
        Ok(self.config.limit.saturating_sub(self.attempts().await?))
    }

    /// Time until the window resets; zero when not blocked
    pub async fn available_in(&self) -> Result<Duration, DomainError> {
        match self.store.window(&self.config.key).await? {
            Some(window) if window.count >= self.config.limit => Ok(window.resets_in),
            _ => Ok(Duration::ZERO),
        }
    }

    /// Reset the counter immediately
    #[allow(dead_code)]
    pub async fn clear(&self) -> Result<(), DomainError> {
        self.store.clear(&self.config.key).await
    }

    /// Advisory wait before retrying: `window * multiplier^attempts`, capped
    ///
    /// Zero when nothing has been attempted in the current window.
    pub async fn backoff_delay(&self) -> Result<Duration, DomainError> {
        let attempts = self.attempts().await?;
        if attempts == 0 {
            return Ok(Duration::ZERO);
        }

        let factor = self
            .config
            .backoff_multiplier
            .checked_pow(attempts)
            .unwrap_or(u32::MAX);
        Ok(self
            .config
            .window
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.config.max_backoff))
    }

    pub async fn should_use_backoff(&self) -> Result<bool, DomainError> {
        Ok(self.attempts().await? > 0 && !self.can_make_request().await?)
    }

    pub async fn status(&self) -> Result<LimiterStatus, DomainError> {
        Ok(LimiterStatus {
            can_make_request: self.can_make_request().await?,
            remaining_attempts: self.remaining_attempts().await?,
            attempts_made: self.attempts().await?,
            rate_limit: self.config.limit,
            available_in_seconds: ceil_secs(self.available_in().await?),
            decay_minutes: self.config.decay_minutes(),
        })
    }

    /// Advisory backoff for a refused caller
    ///
    /// Zero while the window has room, one full window when the store is unreachable.
    pub async fn suggested_backoff(&self) -> Duration {
        match self.should_use_backoff().await {
            Ok(false) => Duration::ZERO,
            Ok(true) => self.backoff_delay().await.unwrap_or(self.config.window),
            Err(_) => self.config.window,
        }
    }

    /// Run `action` if the window has room
    ///
    /// The hit is counted before `action` runs. Returns `Ok(None)` without
    /// calling `action` when the limit is reached.
    pub async fn attempt<F, Fut, T>(&self, action: F) -> Result<Option<T>, DomainError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        let hit = self
            .store
            .try_hit(&self.config.key, self.config.limit, self.config.window)
            .await?;

        match hit {
            Some(_) => Ok(Some(action().await)),
            None => {
                self.log_rate_limit_hit().await;
                Ok(None)
            }
        }
    }

    async fn log_rate_limit_hit(&self) {
        let backoff_seconds = ceil_secs(self.suggested_backoff().await);
        match self.status().await {
            Ok(status) => tracing::warn!(
                rate_limit = status.rate_limit,
                attempts_made = status.attempts_made,
                available_in_seconds = status.available_in_seconds,
                remaining_attempts = status.remaining_attempts,
                backoff_seconds,
                "Completion API rate limit exceeded"
            ),
            Err(e) => tracing::warn!(error = %e, "Completion API rate limit exceeded"),
        }
    }
}
