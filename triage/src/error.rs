//! Unified error types for the ticket triage tool
//!
//! This module defines error types for each layer:
//! - `DomainError`: errors surfaced by ports (ticket store, job queue, limiter store)
//! - `CompletionError`: completion API client errors
//! - `ClassificationError`: classifier-internal failures, always absorbed into a fallback
//! - `AppError`: command layer errors

use thiserror::Error;

/// Domain layer errors - returned by every port
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether retrying the same operation later can succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, DomainError::NotFound(_) | DomainError::Validation(_))
    }
}

/// Completion API client errors
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    #[error("Request timed out")]
    Timeout,

    #[error("Empty response from completion API")]
    EmptyResponse,

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Reasons a live classification could not be used
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Classification result missing required fields")]
    MissingFields,

    #[error("Invalid confidence value: {0}")]
    InvalidConfidence(String),
}

/// Command layer errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_validation_are_permanent() {
        assert!(!DomainError::NotFound("ticket".into()).is_transient());
        assert!(!DomainError::Validation("bad".into()).is_transient());
    }

    #[test]
    fn storage_failures_are_transient() {
        assert!(DomainError::Database("connection reset".into()).is_transient());
        assert!(DomainError::Queue("unavailable".into()).is_transient());
        assert!(DomainError::Internal("boom".into()).is_transient());
    }

    #[test]
    fn domain_error_wraps_into_app_error() {
        let err: AppError = DomainError::NotFound("ticket 1".into()).into();
        assert_eq!(err.to_string(), "Entity not found: ticket 1");
    }
}
