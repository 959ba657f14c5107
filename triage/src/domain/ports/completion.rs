//! Completion API port
//!
//! Abstracts the external chat-completion service used for classification.

use async_trait::async_trait;

use crate::error::CompletionError;

/// A two-message chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// Client for a chat-completion service
///
/// Treated as unreliable: any call may fail or return text that is not the
/// requested format.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the text of the first completion choice
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, CompletionError>;
}
