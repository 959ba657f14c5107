//! Rate-limited completion client
//!
//! Wraps a `CompletionClient` so every call counts against the shared
//! limiter. A call made while the window is full waits for the reset.

use async_trait::async_trait;

use crate::app::rate_limiter::RateLimiter;
use crate::domain::ports::{ChatPrompt, CompletionClient, LimiterStore};
use crate::error::CompletionError;

pub struct ThrottledClient<C, S>
where
    C: CompletionClient,
    S: LimiterStore,
{
    inner: C,
    limiter: RateLimiter<S>,
}

impl<C, S> ThrottledClient<C, S>
where
    C: CompletionClient,
    S: LimiterStore,
{
    pub fn new(inner: C, limiter: RateLimiter<S>) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl<C, S> CompletionClient for ThrottledClient<C, S>
where
    C: CompletionClient,
    S: LimiterStore,
{
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, CompletionError> {
        let inner = &self.inner;

        loop {
            match self.limiter.attempt(move || inner.complete(prompt)).await {
                Ok(Some(result)) => return result,
                Ok(None) => {
                    let wait = match self.limiter.available_in().await {
                        Ok(wait) => wait,
                        Err(_) => self.limiter.suggested_backoff().await,
                    };
                    tracing::debug!(wait_secs = wait.as_secs(), "Waiting for completion quota");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Rate limiter unavailable, calling completion API directly"
                    );
                    return inner.complete(prompt).await;
                }
            }
        }
    }
}
