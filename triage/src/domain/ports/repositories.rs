//! Repository port traits
//!
//! These traits define the interface for ticket persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::domain::entities::{
    Category, ClassificationUpdate, NewTicket, PageRequest, Ticket, TicketChanges, TicketFilter,
    TicketId, TicketPage, TicketStats,
};
use crate::error::DomainError;

/// Which tickets a bulk classification run selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    /// Uncategorized tickets and tickets below the low-confidence threshold
    NeedsClassification,
    /// Every ticket
    All,
}

impl TicketScope {
    pub fn from_force(force: bool) -> Self {
        if force {
            TicketScope::All
        } else {
            TicketScope::NeedsClassification
        }
    }
}

/// Repository for Ticket entities
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Find a ticket by ID
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError>;

    /// Tickets in scope, oldest first
    async fn find_for_classification(&self, scope: TicketScope)
        -> Result<Vec<Ticket>, DomainError>;

    /// Matching tickets, newest first
    async fn list(&self, filter: &TicketFilter, page: &PageRequest)
        -> Result<TicketPage, DomainError>;

    /// Counters over every ticket
    async fn stats(&self) -> Result<TicketStats, DomainError>;

    /// Create a new ticket
    async fn create(&self, ticket: &NewTicket) -> Result<Ticket, DomainError>;

    /// Apply operator edits to status and note
    async fn update_details(&self, id: &TicketId, changes: &TicketChanges)
        -> Result<(), DomainError>;

    /// Write classifier output; leaves the category alone when `update.category` is None
    async fn update_classification(
        &self,
        id: &TicketId,
        update: &ClassificationUpdate,
    ) -> Result<(), DomainError>;

    /// Set the category by hand and mark the ticket as manually categorized
    async fn set_manual_category(&self, id: &TicketId, category: Category)
        -> Result<(), DomainError>;

    /// Clear the manual flag so the classifier may overwrite the category again
    async fn clear_manual_flag(&self, id: &TicketId) -> Result<(), DomainError>;
}
