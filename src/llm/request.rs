//! Request construction: endpoint and proxy normalisation, headers, client.

use crate::config::Config;
use crate::error::PipelineError;
use std::time::Duration;

pub const COMPLETIONS_PATH: &str = "/chat/completions";

/// Static identification headers, sent to every endpoint. Providers that
/// don't know them ignore them.
pub const REFERER: &str = "https://github.com/ai-screen-translator";
pub const TITLE: &str = "AI Screen Translator";

/// Resolve the configured base into the full completions URL.
///
/// A base that already ends in `/chat/completions` is used as-is, so users
/// can point at either a provider root or a fully custom endpoint.
pub fn normalize_endpoint(api_base: &str) -> String {
    let base = api_base.trim();
    if base.ends_with(COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{}{}", base.trim_end_matches('/'), COMPLETIONS_PATH)
    }
}

/// Blank means no proxy. A value without a scheme gets `http://`.
pub fn normalize_proxy(proxy: &str) -> Option<String> {
    let proxy = proxy.trim();
    if proxy.is_empty() {
        None
    } else if proxy.starts_with("http") || proxy.contains("://") {
        Some(proxy.to_string())
    } else {
        Some(format!("http://{}", proxy))
    }
}

/// HTTP client for one run: whole-request timeout and explicit proxy.
///
/// Without a configured proxy, ambient `HTTP(S)_PROXY` variables are
/// ignored as well.
pub fn build_client(config: &Config) -> Result<reqwest::Client, PipelineError> {
    let mut builder =
        reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs()));

    builder = match normalize_proxy(&config.proxy) {
        Some(proxy_url) => {
            log::info!("[LLM] Using proxy: {}", proxy_url);
            let proxy = reqwest::Proxy::all(&proxy_url)
                .map_err(|e| PipelineError::NetworkFailed(format!("invalid proxy {}: {}", proxy_url, e)))?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| PipelineError::NetworkFailed(e.to_string()))
}

/// Bearer auth, JSON content type, identification headers.
pub fn apply_headers(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request
        .bearer_auth(api_key)
        .header("content-type", "application/json")
        .header("HTTP-Referer", REFERER)
        .header("X-Title", TITLE)
}
