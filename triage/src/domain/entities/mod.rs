//! Domain entities
//!
//! Pure domain models. These are separate from the SeaORM table models in
//! the `entity` module.

pub mod category;
pub mod classification;
pub mod listing;
pub mod task;
pub mod ticket;

pub use category::Category;
#[allow(unused_imports)]
pub use classification::{
    Classification, ClassificationUpdate, DEFAULT_CATEGORY, MAX_EXPLANATION_CHARS,
};
#[allow(unused_imports)]
pub use listing::{
    PageRequest, TicketChanges, TicketFilter, TicketPage, TicketStats, DEFAULT_PER_PAGE,
    MAX_PER_PAGE,
};
pub use task::{JobId, QueuedTask, Task};
#[allow(unused_imports)]
pub use ticket::{NewTicket, Ticket, TicketId, TicketStatus, LOW_CONFIDENCE_THRESHOLD};
