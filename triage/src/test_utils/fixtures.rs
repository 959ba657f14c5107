//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use chrono::{Duration, Utc};

use crate::domain::entities::{Category, Ticket, TicketId, TicketStatus};

/// Create an open, unclassified ticket
pub fn test_ticket() -> Ticket {
    let now = Utc::now();
    Ticket {
        id: TicketId::new(),
        subject: "Cannot log in".to_string(),
        body: "I get an error every time I try to sign in.".to_string(),
        status: TicketStatus::Open,
        category: None,
        confidence: None,
        explanation: None,
        note: None,
        manually_categorized: false,
        created_at: now,
        updated_at: now,
    }
}

/// Create a ticket already classified with the given category and confidence
pub fn test_ticket_categorized(category: Category, confidence: f64) -> Ticket {
    Ticket {
        category: Some(category),
        confidence: Some(confidence),
        explanation: Some("Earlier classification".to_string()),
        ..test_ticket()
    }
}

/// Create a ticket whose category was set by hand
pub fn test_ticket_manual(category: Category) -> Ticket {
    Ticket {
        category: Some(category),
        manually_categorized: true,
        ..test_ticket()
    }
}

/// Create `count` unclassified tickets with increasing creation times
pub fn test_tickets(count: usize) -> Vec<Ticket> {
    let base = Utc::now() - Duration::hours(1);
    (0..count)
        .map(|i| {
            let created_at = base + Duration::seconds(i as i64);
            Ticket {
                subject: format!("Ticket number {}", i + 1),
                created_at,
                updated_at: created_at,
                ..test_ticket()
            }
        })
        .collect()
}
