//! Review prompt construction.

use serde_json::json;

use divbar_core::signal::ConditionDiagnostic;

use super::context::StrategyContext;
use super::AdvisorError;

pub const SYSTEM_MESSAGE: &str = "You are a quantitative trading strategy assistant.";

/// `{context_json}` and `{schema_example}` are substituted by `build_prompt`.
pub const PROMPT_TEMPLATE: &str = "You are a systematic trading strategy reviewer.
Given JSON context below, propose up to 3 precise rule modifications that could improve risk-adjusted performance without materially increasing trade count.
Return STRICT JSON list (no commentary) with objects having keys: change, rationale, implementation_hint.
Focus on modifying existing conditions (oscillator slope, structural filters, trailing logic) or adding reject-filters (volatility, time, regime) using only data available at decision time.
JSON Context:
{context_json}
Schema example for your response:
{schema_example}";

fn schema_example() -> serde_json::Value {
    json!([{
        "change": "Relax oscillator slope for bearish bars to ao >= prev_ao - 0.0005",
        "rationale": "Losing trades show many near-flat oscillator slopes rejected despite good structure.",
        "implementation_hint": "In the detector replace `ao > prev_ao` with `ao >= prev_ao - 0.0005` for the bearish rising check"
    }])
}

/// Render the prompt; the diagnostics table is appended when non-empty.
pub fn build_prompt(
    context: &StrategyContext,
    diagnostics: Option<&[ConditionDiagnostic]>,
) -> Result<String, AdvisorError> {
    let context_json = serde_json::to_string_pretty(context)?;
    let schema = serde_json::to_string_pretty(&schema_example())?;
    let mut prompt = PROMPT_TEMPLATE
        .replace("{context_json}", &context_json)
        .replace("{schema_example}", &schema);

    if let Some(diag) = diagnostics.filter(|d| !d.is_empty()) {
        prompt.push_str("\n\nCONDITION_DIAGNOSTICS_JSON:\n");
        prompt.push_str(&serde_json::to_string_pretty(diag)?);
    }
    Ok(prompt)
}
