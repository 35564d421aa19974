//! Chat-completion clients.
//!
//! `LlmClient` abstracts the model endpoint so the pipeline can be driven by
//! a canned client in tests. `OpenAiClient` calls the OpenAI chat-completions
//! API with a blocking `reqwest` client and retries transient failures with
//! exponential backoff.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::prompt::SYSTEM_MESSAGE;
use super::AdvisorError;
use crate::config::AdvisorConfig;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// First retry delay; each further retry waits `BACKOFF_FACTOR` times longer.
const BASE_DELAY: Duration = Duration::from_secs(2);
const BACKOFF_FACTOR: f64 = 1.8;

/// A model endpoint that turns a prompt into raw reply text.
pub trait LlmClient {
    fn name(&self) -> &str;
    fn complete(&self, prompt: &str) -> Result<String, AdvisorError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    api_key: String,
    config: AdvisorConfig,
    base_delay: Duration,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
            base_delay: BASE_DELAY,
        })
    }

    /// Build a client with the key from `OPENAI_API_KEY`.
    pub fn from_env(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let key = std::env::var(OPENAI_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AdvisorError::MissingApiKey(OPENAI_API_KEY_ENV))?;
        Self::new(key, config)
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    fn request_once(&self, prompt: &str) -> Result<String, AdvisorError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AdvisorError::EmptyResponse)
    }
}

impl LlmClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, prompt: &str) -> Result<String, AdvisorError> {
        let started = Instant::now();
        let content = with_retries(self.config.max_retries, self.base_delay, |_| {
            self.request_once(prompt)
        })?;
        info!(
            model = %self.config.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            length = content.len(),
            "received model response"
        );
        Ok(content)
    }
}

/// Run `op` up to `max_attempts` times (at least once).
///
/// Retryable failures sleep `base_delay`, then `base_delay × 1.8`, and so on.
/// A non-retryable failure is returned immediately.
pub fn with_retries<T, F>(max_attempts: u32, base_delay: Duration, mut op: F) -> Result<T, AdvisorError>
where
    F: FnMut(u32) -> Result<T, AdvisorError>,
{
    let attempts = max_attempts.max(1);
    let mut delay = base_delay;

    for attempt in 1..=attempts {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt == attempts => {
                return Err(AdvisorError::RetriesExhausted {
                    attempts,
                    last: e.to_string(),
                });
            }
            Err(e) => {
                warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "model call failed, retrying");
                std::thread::sleep(delay);
                delay = delay.mul_f64(BACKOFF_FACTOR);
            }
        }
    }

    // attempts >= 1, so the loop always returns
    Err(AdvisorError::RetriesExhausted {
        attempts,
        last: "no attempt made".into(),
    })
}
