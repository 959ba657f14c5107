//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod memory;
pub mod openai;
pub mod postgres;

pub use memory::InMemoryLimiterStore;
#[allow(unused_imports)]
pub use openai::{OpenAiClient, OpenAiSettings};
#[allow(unused_imports)]
pub use postgres::{create_tables, PostgresJobQueue, PostgresTicketRepository};
