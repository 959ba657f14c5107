//! Ticket operations driven by an operator

use std::sync::Arc;

use crate::app::sample_tickets::SampleTicket;
use crate::domain::entities::{
    Category, JobId, NewTicket, PageRequest, Task, Ticket, TicketChanges, TicketFilter, TicketId,
    TicketPage, TicketStats,
};
use crate::domain::ports::{TaskQueue, TicketRepository};
use crate::error::DomainError;

/// Longest subject a ticket may have, in characters
pub const MAX_SUBJECT_CHARS: usize = 255;

pub struct TicketService<TR, Q>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    tickets: Arc<TR>,
    queue: Arc<Q>,
}

impl<TR, Q> TicketService<TR, Q>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    pub fn new(tickets: Arc<TR>, queue: Arc<Q>) -> Self {
        Self { tickets, queue }
    }

    pub async fn get(&self, id: &TicketId) -> Result<Ticket, DomainError> {
        self.tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Ticket {}", id)))
    }

    /// Store a new, unclassified ticket
    pub async fn create(&self, ticket: NewTicket) -> Result<Ticket, DomainError> {
        let ticket = validate_new_ticket(ticket)?;
        let created = self.tickets.create(&ticket).await?;
        tracing::info!(ticket_id = %created.id, status = %created.status, "Ticket created");
        Ok(created)
    }

    pub async fn list(
        &self,
        filter: &TicketFilter,
        page: &PageRequest,
    ) -> Result<TicketPage, DomainError> {
        self.tickets.list(filter, page).await
    }

    pub async fn stats(&self) -> Result<TicketStats, DomainError> {
        self.tickets.stats().await
    }

    /// Apply operator edits; a category counts as a manual override only when it changes
    pub async fn update(
        &self,
        id: &TicketId,
        changes: &TicketChanges,
        category: Option<Category>,
    ) -> Result<Ticket, DomainError> {
        if changes.is_empty() && category.is_none() {
            return Err(DomainError::Validation("Nothing to update".to_string()));
        }

        self.get(id).await?;
        if !changes.is_empty() {
            self.tickets.update_details(id, changes).await?;
            tracing::info!(ticket_id = %id, "Ticket updated");
        }
        match category {
            Some(category) => self.categorize(id, category).await,
            None => self.get(id).await,
        }
    }

    /// Store generated demo tickets, classified ones with their classification
    pub async fn seed(&self, samples: Vec<SampleTicket>) -> Result<Vec<Ticket>, DomainError> {
        let mut created = Vec::with_capacity(samples.len());
        for sample in samples {
            let ticket = self.tickets.create(&sample.ticket).await?;
            if let Some(update) = &sample.classification {
                self.tickets.update_classification(&ticket.id, update).await?;
            }
            created.push(self.get(&ticket.id).await?);
        }
        tracing::info!(tickets = created.len(), "Seeded demo tickets");
        Ok(created)
    }

    /// Set the category by hand; classification will no longer change it
    ///
    /// Picking the category the ticket already has changes nothing, so an
    /// automatic category stays open to reclassification.
    pub async fn categorize(&self, id: &TicketId, category: Category) -> Result<Ticket, DomainError> {
        let ticket = self.get(id).await?;
        if ticket.category == Some(category) {
            tracing::debug!(ticket_id = %id, category = %category, "Category unchanged");
            return Ok(ticket);
        }

        self.tickets.set_manual_category(id, category).await?;
        tracing::info!(ticket_id = %id, category = %category, "Ticket manually categorized");
        self.get(id).await
    }

    /// Let classification overwrite the category again
    pub async fn release_manual_category(&self, id: &TicketId) -> Result<Ticket, DomainError> {
        self.get(id).await?;
        self.tickets.clear_manual_flag(id).await?;
        tracing::info!(ticket_id = %id, "Manual category released");
        self.get(id).await
    }

    /// Enqueue a classify task for one existing ticket
    pub async fn queue_classification(&self, id: &TicketId) -> Result<JobId, DomainError> {
        let ticket = self.get(id).await?;
        let job_id = self.queue.enqueue(&Task::classify(ticket.id)).await?;
        tracing::info!(ticket_id = %ticket.id, job_id = %job_id, "Classification queued");
        Ok(job_id)
    }
}

fn validate_new_ticket(ticket: NewTicket) -> Result<NewTicket, DomainError> {
    let subject = ticket.subject.trim().to_string();
    let body = ticket.body.trim().to_string();

    if subject.is_empty() {
        return Err(DomainError::Validation("Subject is required".to_string()));
    }
    if subject.chars().count() > MAX_SUBJECT_CHARS {
        return Err(DomainError::Validation(format!(
            "Subject must be at most {} characters",
            MAX_SUBJECT_CHARS
        )));
    }
    if body.is_empty() {
        return Err(DomainError::Validation("Body is required".to_string()));
    }

    Ok(NewTicket {
        subject,
        body,
        note: ticket.note.filter(|n| !n.trim().is_empty()),
        ..ticket
    })
}
