//! Task queue port
//!
//! Fire-and-forget enqueue on the producer side, reserve/complete/fail on the
//! worker side. Delivery is at-least-once.

use async_trait::async_trait;

use crate::domain::entities::{JobId, QueuedTask, Task};
use crate::error::DomainError;

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue a task for later execution
    async fn enqueue(&self, task: &Task) -> Result<JobId, DomainError>;

    /// Reserve the oldest available task, if any
    ///
    /// A reserved task is invisible to other workers until completed or failed.
    async fn reserve(&self) -> Result<Option<QueuedTask>, DomainError>;

    /// Remove a finished task
    async fn complete(&self, id: &JobId) -> Result<(), DomainError>;

    /// Mark a task as permanently failed, keeping the last error
    async fn fail(&self, id: &JobId, error: &str) -> Result<(), DomainError>;
}
