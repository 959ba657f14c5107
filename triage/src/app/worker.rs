//! Queue worker
//!
//! Pulls tasks off the queue one at a time and runs them with the job retry
//! policy. Jobs that end in `Failed` stay in the queue marked as failed.

use std::sync::Arc;
use std::time::Duration;

use crate::app::classify_job::{ClassifyTicketJob, JobOutcome, RetryPolicy};
use crate::domain::entities::Task;
use crate::domain::ports::{CompletionClient, TaskQueue, TicketRepository};
use crate::error::DomainError;

/// Counts from a drain run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub classified: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl WorkerReport {
    fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Classified(_) => self.classified += 1,
            JobOutcome::Skipped(_) => self.skipped += 1,
            JobOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.classified + self.skipped + self.failed
    }
}

pub struct QueueWorker<Q, TR, C>
where
    Q: TaskQueue,
    TR: TicketRepository,
    C: CompletionClient,
{
    queue: Arc<Q>,
    job: ClassifyTicketJob<TR, C>,
    policy: RetryPolicy,
}

impl<Q, TR, C> QueueWorker<Q, TR, C>
where
    Q: TaskQueue,
    TR: TicketRepository,
    C: CompletionClient,
{
    pub fn new(queue: Arc<Q>, job: ClassifyTicketJob<TR, C>) -> Self {
        Self::with_policy(queue, job, RetryPolicy::default())
    }

    pub fn with_policy(queue: Arc<Q>, job: ClassifyTicketJob<TR, C>, policy: RetryPolicy) -> Self {
        Self { queue, job, policy }
    }

    /// Reserve and run one task; `None` when the queue is empty
    pub async fn process_next(&self) -> Result<Option<JobOutcome>, DomainError> {
        let Some(queued) = self.queue.reserve().await? else {
            return Ok(None);
        };

        tracing::debug!(
            job_id = %queued.id,
            kind = queued.task.kind(),
            attempts = queued.attempts,
            "Reserved job"
        );

        let outcome = match &queued.task {
            Task::ClassifyTicket { ticket_id } => {
                self.job.run_with_retry(ticket_id, &self.policy).await
            }
        };

        match &outcome {
            JobOutcome::Failed { error, .. } => self.queue.fail(&queued.id, error).await?,
            JobOutcome::Classified(_) | JobOutcome::Skipped(_) => {
                self.queue.complete(&queued.id).await?
            }
        }

        Ok(Some(outcome))
    }

    /// Process tasks until the queue is empty
    pub async fn drain(&self) -> Result<WorkerReport, DomainError> {
        let mut report = WorkerReport::default();
        while let Some(outcome) = self.process_next().await? {
            report.record(&outcome);
        }

        tracing::info!(
            classified = report.classified,
            skipped = report.skipped,
            failed = report.failed,
            "Queue drained"
        );
        Ok(report)
    }

    /// Process tasks forever, sleeping `idle` whenever the queue is empty
    ///
    /// Queue errors are logged and retried after `idle`.
    pub async fn run(&self, idle: Duration) {
        tracing::info!(idle_secs = idle.as_secs(), "Worker started");

        loop {
            match self.process_next().await {
                Ok(Some(_)) => {}
                Ok(None) => tokio::time::sleep(idle).await,
                Err(e) => {
                    tracing::error!(error = %e, "Worker failed to process queue");
                    tokio::time::sleep(idle).await;
                }
            }
        }
    }
}
