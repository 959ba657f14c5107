use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::openai::{OpenAiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::app::job_config::{DEFAULT_DECAY_MINUTES, DEFAULT_RATE_LIMIT};
use crate::app::rate_limiter::LimiterConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_organization: Option<String>,
    pub openai_project: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_request_timeout: Duration,
    /// When false, every classification uses the random fallback
    pub classify_enabled: bool,
    /// Requests per window for the shared completion-API limiter
    pub rate_limit: u32,
    pub decay_minutes: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url: var("DATABASE_URL")
                .ok_or_else(|| AppError::Config("DATABASE_URL must be set".to_string()))?,
            openai_api_key: var("OPENAI_API_KEY").unwrap_or_default(),
            openai_organization: var("OPENAI_ORGANIZATION"),
            openai_project: var("OPENAI_PROJECT"),
            openai_base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_request_timeout: Duration::from_secs(parse_or(
                "OPENAI_REQUEST_TIMEOUT",
                var("OPENAI_REQUEST_TIMEOUT"),
                30,
            )?),
            classify_enabled: var("OPENAI_CLASSIFY_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            rate_limit: parse_or("OPENAI_RATE_LIMIT", var("OPENAI_RATE_LIMIT"), DEFAULT_RATE_LIMIT)?,
            decay_minutes: parse_or(
                "OPENAI_DECAY_MINUTES",
                var("OPENAI_DECAY_MINUTES"),
                DEFAULT_DECAY_MINUTES,
            )?,
        })
    }

    /// Whether classification should call the API at all
    pub fn completion_enabled(&self) -> bool {
        self.classify_enabled && !self.openai_api_key.is_empty()
    }

    pub fn openai_settings(&self) -> OpenAiSettings {
        OpenAiSettings {
            api_key: self.openai_api_key.clone(),
            organization: self.openai_organization.clone(),
            project: self.openai_project.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
            request_timeout: self.openai_request_timeout,
        }
    }

    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig::with_limits(self.rate_limit, self.decay_minutes)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.openai_api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("openai_api_key", &api_key)
            .field("openai_organization", &self.openai_organization)
            .field("openai_project", &self.openai_project)
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("openai_request_timeout", &self.openai_request_timeout)
            .field("classify_enabled", &self.classify_enabled)
            .field("rate_limit", &self.rate_limit)
            .field("decay_minutes", &self.decay_minutes)
            .finish()
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, AppError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
