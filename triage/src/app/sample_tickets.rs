//! Demo tickets for `seed`
//!
//! A mix of plain tickets, tickets with an agent note and tickets that already
//! carry a classification, so listings and stats have something to show.

use rand::Rng;

use crate::domain::entities::{Category, ClassificationUpdate, NewTicket, TicketStatus};

const SUBJECTS: [&str; 12] = [
    "Cannot sign in after password change",
    "Charged twice for the same invoice",
    "Please add an export to spreadsheet",
    "App freezes when opening settings",
    "How do I change my billing address?",
    "Two-factor codes are always rejected",
    "Dashboard charts show no data",
    "Refund for cancelled subscription",
    "Sync between phone and web is stuck",
    "Request: dark theme for the editor",
    "Account locked after failed logins",
    "Uploads over 10MB never finish",
];

const BODIES: [&str; 8] = [
    "This started yesterday and happens every time. I already cleared the cache and tried another browser.",
    "Could someone look into this? It is blocking my team and we have a deadline on Friday.",
    "I checked the help center but could not find anything about it. Screenshots can be sent on request.",
    "Nothing changed on our side as far as I know. Several colleagues see the same thing.",
    "It worked fine last week. Please let me know if you need the account id or any logs.",
    "Not urgent, but it would make daily work a lot easier for us.",
    "The error message only says that something went wrong and to try again later.",
    "We are on the yearly plan and this is the second time this month.",
];

const NOTES: [&str; 4] = [
    "Customer called twice, follow up by phone",
    "Waiting for logs from the customer",
    "Escalated to the platform team",
    "Possible duplicate of an earlier ticket",
];

const EXPLANATIONS: [&str; 4] = [
    "Mentions payment and invoices",
    "Describes an error in the application",
    "Asks for new functionality",
    "Relates to login and account access",
];

/// One generated ticket and, for some, the classification to store with it
#[derive(Debug, Clone)]
pub struct SampleTicket {
    pub ticket: NewTicket,
    pub classification: Option<ClassificationUpdate>,
}

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

/// Build one random demo ticket
pub fn sample_ticket(rng: &mut impl Rng) -> SampleTicket {
    let status = TicketStatus::ALL[rng.gen_range(0..TicketStatus::ALL.len())];
    let note = rng.gen_bool(0.35).then(|| pick(rng, &NOTES).to_string());
    let classification = rng.gen_bool(0.35).then(|| ClassificationUpdate {
        category: Some(Category::ALL[rng.gen_range(0..Category::ALL.len())]),
        explanation: pick(rng, &EXPLANATIONS).to_string(),
        confidence: f64::from(rng.gen_range(60u32..=95)) / 100.0,
    });

    SampleTicket {
        ticket: NewTicket {
            subject: pick(rng, &SUBJECTS).to_string(),
            body: pick(rng, &BODIES).to_string(),
            status,
            note,
        },
        classification,
    }
}

pub fn sample_tickets(rng: &mut impl Rng, count: usize) -> Vec<SampleTicket> {
    (0..count).map(|_| sample_ticket(rng)).collect()
}
