//! PostgreSQL adapters
//!
//! Implementations of the ticket repository and task queue using SeaORM and
//! PostgreSQL.

pub mod job_queue;
pub mod schema;
pub mod ticket_repo;


pub use job_queue::PostgresJobQueue;
pub use schema::create_tables;
pub use ticket_repo::PostgresTicketRepository;
