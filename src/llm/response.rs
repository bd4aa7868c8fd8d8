//! Response parsing for chat-completion calls.

use super::types::{ChatCompletion, TokenUsage, TranslationResult};
use crate::error::PipelineError;

/// Parse a 2xx body. The first choice's message content is the result;
/// usage counters default to zero when the provider leaves them out.
pub fn parse_success(body: &[u8]) -> Result<TranslationResult, PipelineError> {
    let completion: ChatCompletion =
        serde_json::from_slice(body).map_err(|e| PipelineError::ParseFailed(e.to_string()))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::ParseFailed("response has no choices".to_string()))?;

    Ok(TranslationResult {
        text: choice.message.content,
        usage: completion.usage.map(TokenUsage::from).unwrap_or_default(),
    })
}

/// Build the `ApiError` for a non-2xx response.
///
/// Prefers the provider's structured `error.message`, then a top-level
/// `message`, then the raw body.
pub fn parse_error(status: u16, body: &str) -> PipelineError {
    let structured = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .or_else(|| json.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        });

    PipelineError::ApiError {
        status,
        message: structured.unwrap_or_else(|| body.trim().to_string()),
    }
}
