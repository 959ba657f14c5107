//! Queued task payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ticket::TicketId;

/// Unique identifier for a queued job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work that can be enqueued for out-of-process execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Task {
    ClassifyTicket { ticket_id: TicketId },
}

impl Task {
    pub fn classify(ticket_id: TicketId) -> Self {
        Task::ClassifyTicket { ticket_id }
    }

    /// Short name stored alongside the payload
    pub fn kind(&self) -> &'static str {
        match self {
            Task::ClassifyTicket { .. } => "classify_ticket",
        }
    }
}

/// A task reserved by a worker
#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub id: JobId,
    pub task: Task,
    /// Times this job has been reserved, including this one
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}
