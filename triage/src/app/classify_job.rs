//! Classify-ticket job
//!
//! Runs out of process, picked up from the task queue. Classifies one ticket
//! and writes the result back, keeping a manually chosen category.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::app::classifier::TicketClassifier;
use crate::app::job_config::{JOB_BACKOFF, JOB_MAX_ATTEMPTS, JOB_TIMEOUT};
use crate::domain::entities::{Classification, ClassificationUpdate, Ticket, TicketId};
use crate::domain::ports::{CompletionClient, TicketRepository};
use crate::error::DomainError;

/// Retry settings for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after the n-th failed attempt; the last entry repeats
    pub backoff: Vec<Duration>,
    /// Budget for a single attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: JOB_MAX_ATTEMPTS,
            backoff: JOB_BACKOFF.to_vec(),
            timeout: JOB_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1) as usize;
        self.backoff
            .get(index)
            .or(self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// How a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Classification written to the ticket
    Classified(ClassificationUpdate),
    /// Nothing to do, e.g. the ticket was deleted
    Skipped(String),
    /// Every attempt failed
    Failed { attempts: u32, error: String },
}

/// Decide what a classification run writes to `ticket`
///
/// Explanation and confidence are always refreshed; the category only when
/// no human has set it.
pub fn classification_update(ticket: &Ticket, result: Classification) -> ClassificationUpdate {
    ClassificationUpdate {
        category: (!ticket.manually_categorized).then_some(result.category),
        explanation: result.explanation,
        confidence: result.confidence,
    }
}

/// Job that classifies a single ticket
pub struct ClassifyTicketJob<TR, C>
where
    TR: TicketRepository,
    C: CompletionClient,
{
    tickets: Arc<TR>,
    classifier: Arc<TicketClassifier<C>>,
}

impl<TR, C> ClassifyTicketJob<TR, C>
where
    TR: TicketRepository,
    C: CompletionClient,
{
    pub fn new(tickets: Arc<TR>, classifier: Arc<TicketClassifier<C>>) -> Self {
        Self {
            tickets,
            classifier,
        }
    }

    /// One attempt: load, classify, write back
    pub async fn run(&self, ticket_id: &TicketId) -> Result<ClassificationUpdate, DomainError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Ticket {}", ticket_id)))?;

        let result = self
            .classifier
            .classify(&ticket.subject, &ticket.body)
            .instrument(tracing::debug_span!("classify", ticket_id = %ticket.id))
            .await;

        let update = classification_update(&ticket, result);
        self.tickets.update_classification(&ticket.id, &update).await?;

        tracing::info!(
            ticket_id = %ticket.id,
            category = ?update.category,
            confidence = update.confidence,
            manually_categorized = ticket.manually_categorized,
            "Ticket classified"
        );

        Ok(update)
    }

    /// Run with retries, timeouts and backoff; never returns an error
    pub async fn run_with_retry(&self, ticket_id: &TicketId, policy: &RetryPolicy) -> JobOutcome {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match tokio::time::timeout(policy.timeout, self.run(ticket_id)).await {
                Ok(Ok(update)) => return JobOutcome::Classified(update),
                Ok(Err(e)) if !e.is_transient() => {
                    tracing::warn!(ticket_id = %ticket_id, error = %e, "Skipping classification job");
                    return JobOutcome::Skipped(e.to_string());
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {}s", policy.timeout.as_secs()),
            };

            if attempt >= max_attempts {
                tracing::error!(
                    ticket_id = %ticket_id,
                    attempts = attempt,
                    error = %error,
                    "Ticket classification job failed"
                );
                return JobOutcome::Failed {
                    attempts: attempt,
                    error,
                };
            }

            let delay = policy.delay_after(attempt);
            tracing::warn!(
                ticket_id = %ticket_id,
                attempt,
                retry_in_secs = delay.as_secs(),
                error = %error,
                "Classification attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
