//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod bulk_classify;
pub mod classifier;
pub mod classify_job;
pub mod job_config;
pub mod rate_limiter;
pub mod sample_tickets;
pub mod throttled_client;
pub mod ticket_service;
pub mod worker;

#[allow(unused_imports)]
pub use bulk_classify::{
    BulkClassifyService, BulkOptions, DispatchPlan, DispatchProgress, DispatchReport,
};
pub use classifier::{ClassifierMode, TicketClassifier};
#[allow(unused_imports)]
pub use classify_job::{ClassifyTicketJob, JobOutcome, RetryPolicy};
#[allow(unused_imports)]
pub use rate_limiter::{LimiterConfig, RateLimiter};
pub use throttled_client::ThrottledClient;
pub use ticket_service::TicketService;
#[allow(unused_imports)]
pub use worker::{QueueWorker, WorkerReport};
