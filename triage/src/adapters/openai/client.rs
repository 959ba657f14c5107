//! OpenAI chat-completions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{ChatPrompt, CompletionClient};
use crate::error::CompletionError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const MAX_TOKENS: u32 = 200;
const TEMPERATURE: f64 = 0.1;

/// Connection settings for the OpenAI API
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
            project: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Implementation of `CompletionClient` on the chat-completions endpoint
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            settings,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CompletionError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| CompletionError::Deserialization(e.to_string()))
        } else if status.as_u16() == 401 {
            Err(CompletionError::Unauthorized)
        } else if status.as_u16() == 429 {
            Err(CompletionError::RateLimited)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Request types for the chat-completions endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let mut request = self
            .http
            .post(self.api_url("/chat/completions"))
            .bearer_auth(&self.settings.api_key)
            .json(&body);
        if let Some(organization) = &self.settings.organization {
            request = request.header("OpenAI-Organization", organization);
        }
        if let Some(project) = &self.settings.project {
            request = request.header("OpenAI-Project", project);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::Request(e)
            }
        })?;

        let chat: ChatResponse = self.handle_response(response).await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}
