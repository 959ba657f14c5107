//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod completion;
pub mod queue;
pub mod rate_limit;
pub mod repositories;

pub use completion::{ChatPrompt, CompletionClient};
pub use queue::TaskQueue;
#[allow(unused_imports)]
pub use rate_limit::{LimiterStore, WindowSnapshot};
pub use repositories::{TicketRepository, TicketScope};
