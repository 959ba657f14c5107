//! Bulk classification dispatch
//!
//! Selects tickets that need classification, then enqueues one classify task
//! per ticket in batches, paced by the shared rate limiter and an optional
//! pause between batches. Enqueue failures are counted and never stop a run.

use std::sync::Arc;
use std::time::Duration;

use crate::app::rate_limiter::RateLimiter;
use crate::domain::entities::{JobId, Task, Ticket};
use crate::domain::ports::{LimiterStore, TaskQueue, TicketRepository, TicketScope};
use crate::error::DomainError;

/// Operator options for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOptions {
    pub batch_size: usize,
    pub delay: Duration,
    /// Select every ticket instead of only those needing classification
    pub force: bool,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self::new(10, 1, false)
    }
}

impl BulkOptions {
    /// Batch size is floored at 1
    pub fn new(batch_size: usize, delay_secs: u64, force: bool) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay: Duration::from_secs(delay_secs),
            force,
        }
    }
}

/// Tickets selected for a run, plus the numbers shown in a dry run
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub tickets: Vec<Ticket>,
    pub batch_size: usize,
    pub rate_limit: u32,
    pub delay: Duration,
}

impl DispatchPlan {
    pub fn total(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn batch_count(&self) -> usize {
        self.total().div_ceil(self.batch_size.max(1))
    }

    /// `batches * delay + ceil(total / rate_limit * 60)` seconds
    pub fn estimated_duration(&self) -> Duration {
        let total = self.total() as u64;
        let rate = u64::from(self.rate_limit.max(1));
        let pacing = total.saturating_mul(60).div_ceil(rate);
        let pauses = (self.batch_count() as u64).saturating_mul(self.delay.as_secs());
        Duration::from_secs(pauses.saturating_add(pacing))
    }

    pub fn batches(&self) -> impl Iterator<Item = &[Ticket]> {
        self.tickets.chunks(self.batch_size.max(1))
    }
}

/// Totals for a finished run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Tickets whose task was enqueued
    pub processed: usize,
    /// Tickets whose task could not be enqueued
    pub errors: usize,
}

/// Observer for run progress, implemented by the terminal progress bar
pub trait DispatchProgress: Send + Sync {
    /// A ticket was handled; `queued` is false when enqueueing failed
    fn ticket_done(&self, ticket: &Ticket, queued: bool);

    /// Dispatch is paused until the limiter window resets
    fn rate_limited(&self, wait: Duration) {
        let _ = wait;
    }

    /// Pausing between batches
    fn batch_pause(&self, delay: Duration) {
        let _ = delay;
    }
}

/// Progress observer that ignores everything
pub struct NoProgress;

impl DispatchProgress for NoProgress {
    fn ticket_done(&self, _ticket: &Ticket, _queued: bool) {}
}

/// Service that plans and runs bulk classification
pub struct BulkClassifyService<TR, Q, S>
where
    TR: TicketRepository,
    Q: TaskQueue,
    S: LimiterStore,
{
    tickets: Arc<TR>,
    queue: Arc<Q>,
    limiter: RateLimiter<S>,
}

impl<TR, Q, S> BulkClassifyService<TR, Q, S>
where
    TR: TicketRepository,
    Q: TaskQueue,
    S: LimiterStore,
{
    pub fn new(tickets: Arc<TR>, queue: Arc<Q>, limiter: RateLimiter<S>) -> Self {
        Self {
            tickets,
            queue,
            limiter,
        }
    }

    /// Select tickets for a run; nothing is dispatched
    pub async fn plan(&self, options: &BulkOptions) -> Result<DispatchPlan, DomainError> {
        let tickets = self
            .tickets
            .find_for_classification(TicketScope::from_force(options.force))
            .await?;

        tracing::debug!(
            tickets = tickets.len(),
            force = options.force,
            "Selected tickets for classification"
        );

        Ok(DispatchPlan {
            tickets,
            batch_size: options.batch_size.max(1),
            rate_limit: self.limiter.rate_limit(),
            delay: options.delay,
        })
    }

    /// Enqueue a classify task for every planned ticket
    pub async fn dispatch(
        &self,
        plan: &DispatchPlan,
        progress: &dyn DispatchProgress,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let batch_count = plan.batch_count();

        for (index, batch) in plan.batches().enumerate() {
            tracing::debug!(
                batch = index + 1,
                of = batch_count,
                size = batch.len(),
                "Dispatching batch"
            );

            for ticket in batch {
                match self.dispatch_one(ticket, progress).await {
                    Ok(job_id) => {
                        tracing::debug!(
                            ticket_id = %ticket.id,
                            job_id = %job_id,
                            "Queued classification"
                        );
                        report.processed += 1;
                        progress.ticket_done(ticket, true);
                    }
                    Err(e) => {
                        tracing::error!(
                            ticket_id = %ticket.id,
                            error = %e,
                            "Failed to queue ticket classification"
                        );
                        report.errors += 1;
                        progress.ticket_done(ticket, false);
                    }
                }
            }

            if index + 1 < batch_count && !plan.delay.is_zero() {
                progress.batch_pause(plan.delay);
                tokio::time::sleep(plan.delay).await;
            }
        }

        tracing::info!(
            processed = report.processed,
            errors = report.errors,
            "Bulk classification dispatch finished"
        );
        report
    }

    /// Enqueue one ticket, waiting out the limiter window when it is full
    async fn dispatch_one(
        &self,
        ticket: &Ticket,
        progress: &dyn DispatchProgress,
    ) -> Result<JobId, DomainError> {
        let task = Task::classify(ticket.id);

        loop {
            let queue = self.queue.clone();
            let task = task.clone();
            let attempt = self
                .limiter
                .attempt(move || async move { queue.enqueue(&task).await })
                .await?;

            match attempt {
                Some(result) => return result,
                None => {
                    let wait = self.limiter.available_in().await?;
                    progress.rate_limited(wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
