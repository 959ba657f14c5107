//! OpenAI adapter
//!
//! Chat-completions implementation of the `CompletionClient` port.

pub mod client;

pub use client::{OpenAiClient, OpenAiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
