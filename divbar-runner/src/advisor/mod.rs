//! LLM rule-suggestion advisor.
//!
//! Summarises a finished backtest into a compact JSON context, wraps it in a
//! fixed review prompt, sends it to a chat-completion model and parses the
//! reply into `{change, rationale, implementation_hint}` records.
//!
//! Suggestions are advisory. Nothing here modifies detector or manager logic.

pub mod client;
pub mod context;
pub mod prompt;
pub mod suggestions;

pub use client::{with_retries, LlmClient, OpenAiClient, OPENAI_API_KEY_ENV};
pub use context::{extract_context, PerformanceSlice, StrategyContext, TradeContext};
pub use prompt::{build_prompt, PROMPT_TEMPLATE, SYSTEM_MESSAGE};
pub use suggestions::{parse_suggestions, Suggestion};

use thiserror::Error;

use divbar_core::signal::ConditionDiagnostic;

/// Structured errors from the advisor.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("environment variable {0} is not set")]
    MissingApiKey(&'static str),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response contained no message content")]
    EmptyResponse,

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl AdvisorError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdvisorError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AdvisorError::Status { status, .. } => *status == 429 || *status >= 500,
            AdvisorError::EmptyResponse => true,
            _ => false,
        }
    }
}

/// Context → prompt → model → parsed suggestions.
pub fn generate_suggestions(
    client: &dyn LlmClient,
    context: &StrategyContext,
    diagnostics: Option<&[ConditionDiagnostic]>,
) -> Result<Vec<Suggestion>, AdvisorError> {
    let prompt = build_prompt(context, diagnostics)?;
    let raw = client.complete(&prompt)?;
    Ok(parse_suggestions(&raw))
}
