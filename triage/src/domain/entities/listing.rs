//! Ticket listing, statistics and partial updates

use std::collections::BTreeMap;

use serde::Serialize;

use super::category::Category;
use super::ticket::{Ticket, TicketStatus};

/// Page size when none is given
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Largest page a listing returns
pub const MAX_PER_PAGE: u64 = 50;

/// Filters for a ticket listing; `None` matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketFilter {
    /// Case-insensitive substring of the subject or the body
    pub search: Option<String>,
    pub status: Option<TicketStatus>,
    pub category: Option<Category>,
}

impl TicketFilter {
    /// Blank search text counts as no search
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    #[allow(dead_code)]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        if self.category.is_some() && self.category != ticket.category {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                ticket.subject.to_lowercase().contains(&term)
                    || ticket.body.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

/// One-based page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Page is floored at 1; page size is kept within 1..=MAX_PER_PAGE
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// Tickets of one page, newest first
#[derive(Debug, Clone, Serialize)]
pub struct TicketPage {
    pub tickets: Vec<Ticket>,
    /// Matching tickets across all pages
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl TicketPage {
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page.max(1)).max(1)
    }
}

/// Dashboard counters over every ticket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketStats {
    pub total_tickets: u64,
    /// Keyed by status, e.g. `in_progress`
    pub by_status: BTreeMap<String, u64>,
    /// Keyed by category key; uncategorized tickets are left out
    pub by_category: BTreeMap<String, u64>,
    pub classified_tickets: u64,
    /// Mean over tickets that have a confidence
    pub average_confidence: Option<f64>,
}

impl TicketStats {
    /// Fold tickets into counters
    #[allow(dead_code)]
    pub fn from_tickets<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Self {
        let mut stats = TicketStats::default();
        let mut confidence_sum = 0.0;
        let mut confidence_count = 0u64;

        for ticket in tickets {
            stats.total_tickets += 1;
            *stats.by_status.entry(ticket.status.to_string()).or_default() += 1;
            if let Some(category) = ticket.category {
                stats.classified_tickets += 1;
                *stats.by_category.entry(category.key().to_string()).or_default() += 1;
            }
            if let Some(confidence) = ticket.confidence {
                confidence_sum += confidence;
                confidence_count += 1;
            }
        }

        if confidence_count > 0 {
            stats.average_confidence = Some(confidence_sum / confidence_count as f64);
        }
        stats
    }
}

/// Operator edits to a ticket; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketChanges {
    pub status: Option<TicketStatus>,
    /// `Some(None)` clears the note
    pub note: Option<Option<String>>,
}

impl TicketChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.note.is_none()
    }
}
