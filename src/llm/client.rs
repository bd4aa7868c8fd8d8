//! Chat-completion call against an OpenAI-compatible endpoint.

use super::request::{apply_headers, build_client, normalize_endpoint};
use super::response::{parse_error, parse_success};
use super::types::{ChatMessage, ChatRequest, TranslationResult};
use crate::config::Config;
use crate::error::PipelineError;

/// Send `messages` and return the translated text with its token usage.
///
/// A blank API key fails before any connection is opened. Timeouts and
/// connection errors are `NetworkFailed`; non-2xx is `ApiError`; a 2xx body
/// of the wrong shape is `ParseFailed`. Nothing is retried.
pub async fn send(messages: Vec<ChatMessage>, config: &Config) -> Result<TranslationResult, PipelineError> {
    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        log::warn!("[LLM] No API key configured — request not sent");
        return Err(PipelineError::MissingApiKey);
    }

    let url = normalize_endpoint(&config.api_base);
    let client = build_client(config)?;
    let body = ChatRequest::new(config.model.trim(), messages);

    log::info!("[LLM] POST {}", url);
    log::info!("[LLM] Model: {}", body.model);
    log::info!("[LLM] API key present ({} chars)", api_key.len());

    let start = std::time::Instant::now();
    let response = apply_headers(client.post(&url), api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            log::error!("[LLM] HTTP request failed: {}", e);
            PipelineError::NetworkFailed(describe(&e))
        })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| {
        log::error!("[LLM] Failed to read response body: {}", e);
        PipelineError::NetworkFailed(describe(&e))
    })?;
    log::info!(
        "[LLM] {} in {}ms ({} bytes)",
        status,
        start.elapsed().as_millis(),
        bytes.len()
    );

    if !status.is_success() {
        let text = String::from_utf8_lossy(&bytes);
        log::error!("[LLM] API returned {}: {}", status, text);
        return Err(parse_error(status.as_u16(), &text));
    }

    let result = parse_success(&bytes).map_err(|e| {
        log::warn!(
            "[LLM] Unexpected response shape: {} — raw: {}",
            e,
            String::from_utf8_lossy(&bytes[..bytes.len().min(200)])
        );
        e
    })?;
    log::info!(
        "[LLM] Input tokens: {}, output tokens: {}",
        result.usage.input_tokens,
        result.usage.output_tokens
    );
    Ok(result)
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
