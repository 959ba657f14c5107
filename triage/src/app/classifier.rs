//! Ticket classifier
//!
//! Turns ticket text into a `Classification` using the completion API.
//! Classification never fails from the caller's point of view: when the API
//! is disabled, unreachable or answers with something unusable, a random
//! fallback classification is returned instead.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::domain::entities::{Category, Classification, MAX_EXPLANATION_CHARS};
use crate::domain::ports::{ChatPrompt, CompletionClient};
use crate::error::{ClassificationError, CompletionError};

/// Explanation attached to every fallback classification
pub const FALLBACK_EXPLANATION: &str = "Auto-classified (AI disabled)";

/// Fallback confidence bounds, in hundredths
const FALLBACK_CONFIDENCE_MIN: u32 = 60;
const FALLBACK_CONFIDENCE_MAX: u32 = 95;

/// How the classifier produces results
pub enum ClassifierMode<C> {
    /// Ask the completion API
    Live(Arc<C>),
    /// Always return the fallback
    Disabled,
}

/// Service that classifies ticket text
pub struct TicketClassifier<C>
where
    C: CompletionClient,
{
    mode: ClassifierMode<C>,
    rng: Mutex<StdRng>,
}

impl<C> TicketClassifier<C>
where
    C: CompletionClient,
{
    pub fn new(mode: ClassifierMode<C>) -> Self {
        Self::with_rng(mode, StdRng::from_entropy())
    }

    /// Use a specific random source for fallback results
    pub fn with_rng(mode: ClassifierMode<C>, rng: StdRng) -> Self {
        Self {
            mode,
            rng: Mutex::new(rng),
        }
    }

    /// Classify a ticket's subject and body
    pub async fn classify(&self, subject: &str, body: &str) -> Classification {
        let client = match &self.mode {
            ClassifierMode::Live(client) => client,
            ClassifierMode::Disabled => return self.fallback(),
        };

        match self.classify_live(client.as_ref(), subject, body).await {
            Ok(classification) => classification,
            Err(e) => {
                tracing::error!(error = %e, "Completion classification failed, using fallback");
                self.fallback()
            }
        }
    }

    async fn classify_live(
        &self,
        client: &C,
        subject: &str,
        body: &str,
    ) -> Result<Classification, ClassificationError> {
        let content = client.complete(&build_prompt(subject, body)).await?;
        parse_classification(&content)
    }

    /// Random category, fixed explanation, confidence in [0.60, 0.95]
    pub fn fallback(&self) -> Classification {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let category = Category::ALL[rng.gen_range(0..Category::ALL.len())];
        let hundredths = rng.gen_range(FALLBACK_CONFIDENCE_MIN..=FALLBACK_CONFIDENCE_MAX);

        Classification {
            category,
            explanation: FALLBACK_EXPLANATION.to_string(),
            confidence: f64::from(hundredths) / 100.0,
        }
    }
}

/// System prompt listing every category and the required response shape
pub fn system_prompt() -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| format!("- {}: {}", c.key(), c.label()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a support ticket classifier. Analyze the given ticket and respond with a JSON object containing exactly these keys:\n\n\
        - category: one of these categories:\n{}\n\
        - explanation: a brief explanation (max {} chars) of why you chose this category\n\
        - confidence: a decimal between 0.0 and 1.0 representing your confidence in the classification\n\n\
        Example response:\n\
        {{\"category\": \"technical\", \"explanation\": \"User reporting login issues with specific error message\", \"confidence\": 0.85}}\n\n\
        Respond only with valid JSON, no additional text.",
        categories, MAX_EXPLANATION_CHARS
    )
}

pub fn build_prompt(subject: &str, body: &str) -> ChatPrompt {
    ChatPrompt {
        system: system_prompt(),
        user: format!("Subject: {}\n\nBody: {}", subject, body),
    }
}

/// Parse and normalize the completion text
///
/// All three keys must be present and non-null. `confidence` may be a number
/// or a numeric string.
pub fn parse_classification(content: &str) -> Result<Classification, ClassificationError> {
    if content.trim().is_empty() {
        return Err(CompletionError::EmptyResponse.into());
    }

    let value: Value = serde_json::from_str(content)?;
    let field = |name: &str| value.get(name).filter(|v| !v.is_null());

    let (Some(category), Some(explanation), Some(confidence)) =
        (field("category"), field("explanation"), field("confidence"))
    else {
        return Err(ClassificationError::MissingFields);
    };

    let confidence = match confidence {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ClassificationError::InvalidConfidence(confidence.to_string()))?;

    Ok(Classification::normalized(
        &text_of(category),
        &text_of(explanation),
        confidence,
    ))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
