//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::domain::entities::{
    Category, ClassificationUpdate, JobId, NewTicket, PageRequest, QueuedTask, Task, Ticket,
    TicketChanges, TicketFilter, TicketId, TicketPage, TicketStats,
};
use crate::domain::ports::{
    ChatPrompt, CompletionClient, LimiterStore, TaskQueue, TicketRepository, TicketScope,
    WindowSnapshot,
};
use crate::error::{CompletionError, DomainError};

// ============================================================================
// In-Memory Ticket Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
    /// Remaining `update_classification` calls that fail with a database error
    failing_updates: Arc<RwLock<u32>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a ticket for testing
    pub fn with_ticket(self, ticket: Ticket) -> Self {
        {
            let mut tickets = self.tickets.write().unwrap();
            tickets.insert(ticket.id, ticket);
        }
        self
    }

    /// Make the next `count` classification updates fail
    pub fn with_failing_updates(self, count: u32) -> Self {
        *self.failing_updates.write().unwrap() = count;
        self
    }

    /// Current stored state of a ticket
    pub fn get(&self, id: &TicketId) -> Option<Ticket> {
        self.tickets.read().unwrap().get(id).cloned()
    }

    fn modify(
        &self,
        id: &TicketId,
        change: impl FnOnce(&mut Ticket),
    ) -> Result<(), DomainError> {
        let mut tickets = self.tickets.write().unwrap();
        let ticket = tickets
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Ticket {}", id)))?;
        change(ticket);
        ticket.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError> {
        let tickets = self.tickets.read().unwrap();
        Ok(tickets.get(id).cloned())
    }

    async fn find_for_classification(
        &self,
        scope: TicketScope,
    ) -> Result<Vec<Ticket>, DomainError> {
        let tickets = self.tickets.read().unwrap();
        let mut selected: Vec<Ticket> = tickets
            .values()
            .filter(|t| scope == TicketScope::All || t.needs_classification())
            .cloned()
            .collect();
        selected.sort_by_key(|t| t.created_at);
        Ok(selected)
    }

    async fn list(
        &self,
        filter: &TicketFilter,
        page: &PageRequest,
    ) -> Result<TicketPage, DomainError> {
        let tickets = self.tickets.read().unwrap();
        let mut matching: Vec<Ticket> = tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let tickets = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();
        Ok(TicketPage {
            tickets,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn stats(&self) -> Result<TicketStats, DomainError> {
        let tickets = self.tickets.read().unwrap();
        Ok(TicketStats::from_tickets(tickets.values()))
    }

    async fn create(&self, ticket: &NewTicket) -> Result<Ticket, DomainError> {
        let now = Utc::now();
        let new_ticket = Ticket {
            id: TicketId::new(),
            subject: ticket.subject.clone(),
            body: ticket.body.clone(),
            status: ticket.status,
            category: None,
            confidence: None,
            explanation: None,
            note: ticket.note.clone(),
            manually_categorized: false,
            created_at: now,
            updated_at: now,
        };
        let mut tickets = self.tickets.write().unwrap();
        tickets.insert(new_ticket.id, new_ticket.clone());
        Ok(new_ticket)
    }

    async fn update_classification(
        &self,
        id: &TicketId,
        update: &ClassificationUpdate,
    ) -> Result<(), DomainError> {
        {
            let mut remaining = self.failing_updates.write().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DomainError::Database("connection refused".to_string()));
            }
        }

        self.modify(id, |ticket| {
            if let Some(category) = update.category {
                ticket.category = Some(category);
            }
            ticket.explanation = Some(update.explanation.clone());
            ticket.confidence = Some(update.confidence);
        })
    }

    async fn set_manual_category(
        &self,
        id: &TicketId,
        category: Category,
    ) -> Result<(), DomainError> {
        self.modify(id, |ticket| {
            ticket.category = Some(category);
            ticket.manually_categorized = true;
        })
    }

    async fn clear_manual_flag(&self, id: &TicketId) -> Result<(), DomainError> {
        self.modify(id, |ticket| ticket.manually_categorized = false)
    }

    async fn update_details(
        &self,
        id: &TicketId,
        changes: &TicketChanges,
    ) -> Result<(), DomainError> {
        self.modify(id, |ticket| {
            if let Some(status) = changes.status {
                ticket.status = status;
            }
            if let Some(note) = &changes.note {
                ticket.note = note.clone();
            }
        })
    }
}

// ============================================================================
// In-Memory Task Queue
// ============================================================================

#[derive(Default)]
pub struct InMemoryTaskQueue {
    pending: Arc<RwLock<VecDeque<QueuedTask>>>,
    reserved: Arc<RwLock<HashMap<JobId, QueuedTask>>>,
    enqueued: Arc<RwLock<Vec<Task>>>,
    completed: Arc<RwLock<Vec<JobId>>>,
    failed: Arc<RwLock<Vec<(JobId, String)>>>,
    failing_tickets: Arc<RwLock<HashSet<TicketId>>>,
    pub should_fail: Arc<RwLock<bool>>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue whose enqueue always fails
    pub fn failing() -> Self {
        Self {
            should_fail: Arc::new(RwLock::new(true)),
            ..Self::default()
        }
    }

    /// Fail enqueueing tasks for one ticket
    pub fn failing_for(self, ticket_id: TicketId) -> Self {
        self.failing_tickets.write().unwrap().insert(ticket_id);
        self
    }

    /// Every successfully enqueued task, in order
    pub fn enqueued(&self) -> Vec<Task> {
        self.enqueued.read().unwrap().clone()
    }

    pub fn pending(&self) -> usize {
        self.pending.read().unwrap().len()
    }

    pub fn completed(&self) -> Vec<JobId> {
        self.completed.read().unwrap().clone()
    }

    pub fn failed(&self) -> Vec<(JobId, String)> {
        self.failed.read().unwrap().clone()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: &Task) -> Result<JobId, DomainError> {
        if *self.should_fail.read().unwrap() {
            return Err(DomainError::Queue("queue unavailable".to_string()));
        }
        let Task::ClassifyTicket { ticket_id } = task;
        if self.failing_tickets.read().unwrap().contains(ticket_id) {
            return Err(DomainError::Queue(format!("cannot enqueue {}", ticket_id)));
        }

        let id = JobId::new();
        self.pending.write().unwrap().push_back(QueuedTask {
            id,
            task: task.clone(),
            attempts: 0,
            created_at: Utc::now(),
        });
        self.enqueued.write().unwrap().push(task.clone());
        Ok(id)
    }

    async fn reserve(&self) -> Result<Option<QueuedTask>, DomainError> {
        let Some(mut queued) = self.pending.write().unwrap().pop_front() else {
            return Ok(None);
        };
        queued.attempts += 1;
        self.reserved
            .write()
            .unwrap()
            .insert(queued.id, queued.clone());
        Ok(Some(queued))
    }

    async fn complete(&self, id: &JobId) -> Result<(), DomainError> {
        self.reserved
            .write()
            .unwrap()
            .remove(id)
            .ok_or_else(|| DomainError::NotFound(format!("Job {}", id)))?;
        self.completed.write().unwrap().push(*id);
        Ok(())
    }

    async fn fail(&self, id: &JobId, error: &str) -> Result<(), DomainError> {
        self.reserved
            .write()
            .unwrap()
            .remove(id)
            .ok_or_else(|| DomainError::NotFound(format!("Job {}", id)))?;
        self.failed.write().unwrap().push((*id, error.to_string()));
        Ok(())
    }
}

// ============================================================================
// Mock Completion Client
// ============================================================================

#[derive(Default)]
pub struct MockCompletionClient {
    /// Text returned by every call; `None` makes every call fail
    response: Option<String>,
    delay: Duration,
    prompts: Arc<RwLock<Vec<ChatPrompt>>>,
}

impl MockCompletionClient {
    /// Client answering every prompt with `text`
    pub fn responding(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// Client whose every call fails with a server error
    pub fn failing() -> Self {
        Self::default()
    }

    /// Wait this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.read().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<ChatPrompt> {
        self.prompts.read().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, CompletionError> {
        self.prompts.write().unwrap().push(prompt.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.response.clone().ok_or_else(|| CompletionError::Api {
            status: 500,
            message: "internal server error".to_string(),
        })
    }
}

// ============================================================================
// Unavailable Limiter Store
// ============================================================================

/// Limiter store whose backend is down; every call fails
pub struct UnavailableLimiterStore;

#[async_trait]
impl LimiterStore for UnavailableLimiterStore {
    async fn try_hit(
        &self,
        _key: &str,
        _limit: u32,
        _window: Duration,
    ) -> Result<Option<u32>, DomainError> {
        Err(DomainError::Internal("limiter store offline".to_string()))
    }

    async fn window(&self, _key: &str) -> Result<Option<WindowSnapshot>, DomainError> {
        Err(DomainError::Internal("limiter store offline".to_string()))
    }

    async fn clear(&self, _key: &str) -> Result<(), DomainError> {
        Err(DomainError::Internal("limiter store offline".to_string()))
    }
}
