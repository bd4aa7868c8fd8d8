//! End-to-end tests for a single pipeline pass.
//!
//! Real encoder, request builder, client and parser; fake screen and OCR;
//! a canned local endpoint instead of a provider.

mod support;

use base64::Engine;
use screen_translator_lib::error::PipelineError;
use screen_translator_lib::llm::TokenUsage;
use screen_translator_lib::run_pipeline;
use std::sync::Arc;
use support::*;

#[tokio::test]
async fn ocr_mode_sends_prompt_and_text() {
    let server = serve(200, SUCCESS_BODY).await;
    let config = test_config(&format!("{}/v1", server.url), false);

    let result = run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        FixedOcr::text("  Hello world \n"),
    )
    .await
    .unwrap();

    assert_eq!(result.text, "你好，世界");
    assert_eq!(
        result.usage,
        TokenUsage {
            input_tokens: 42,
            output_tokens: 7
        }
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.request_line(), "POST /v1/chat/completions HTTP/1.1");
    assert_eq!(request.header("authorization").as_deref(), Some("Bearer sk-test"));
    assert_eq!(request.header("content-type").as_deref(), Some("application/json"));
    assert_eq!(
        request.header("http-referer").as_deref(),
        Some("https://github.com/ai-screen-translator")
    );
    assert_eq!(request.header("x-title").as_deref(), Some("AI Screen Translator"));
    assert_eq!(
        request.json(),
        serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Translate:\n\nHello world"}],
            "stream": false
        })
    );
}

#[tokio::test]
async fn vision_mode_sends_one_message_with_text_and_jpeg_parts() {
    let server = serve(200, SUCCESS_BODY).await;
    let config = test_config(&server.url, true);

    run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        Arc::new(FixedOcr(Err("OCR must not run in vision mode".to_string()))),
    )
    .await
    .unwrap();

    let body = server.requests()[0].json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);

    let parts = messages[0]["content"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], serde_json::json!({"type": "text", "text": "Translate:"}));
    assert_eq!(parts[1]["type"], "image_url");

    let url = parts[1]["image_url"]["url"].as_str().unwrap();
    let encoded = url.strip_prefix("data:image/jpeg;base64,").unwrap();
    let jpeg = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
    assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);

    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 32));
    assert!(!decoded.color().has_alpha());
}

#[tokio::test]
async fn blank_ocr_result_stops_before_the_network() {
    let server = serve(200, SUCCESS_BODY).await;
    let config = test_config(&server.url, false);

    let err = run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        FixedOcr::text(" \n \t\n"),
    )
    .await
    .unwrap_err();

    assert_eq!(err, PipelineError::OcrEmpty);
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn missing_api_key_makes_no_request() {
    let server = serve(200, SUCCESS_BODY).await;
    let mut config = test_config(&server.url, false);
    config.api_key = "   ".to_string();

    let err = run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        FixedOcr::text("text"),
    )
    .await
    .unwrap_err();

    assert_eq!(err, PipelineError::MissingApiKey);
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn unauthorized_response_is_api_error_with_provider_message() {
    let server = serve(401, r#"{"error":{"message":"invalid key"}}"#).await;
    let config = test_config(&server.url, false);

    let err = run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        FixedOcr::text("text"),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err,
        PipelineError::ApiError {
            status: 401,
            message: "invalid key".to_string()
        }
    );
}

#[tokio::test]
async fn unexpected_success_shape_is_parse_failure() {
    let server = serve(200, r#"{"result": "no choices here"}"#).await;
    let config = test_config(&server.url, false);

    let err = run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        FixedOcr::text("text"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::ParseFailed(_)), "got {:?}", err);
}

#[tokio::test]
async fn refused_connection_is_network_failure() {
    let config = test_config(&closed_port_url().await, false);

    let err = run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        FixedOcr::text("text"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::NetworkFailed(_)), "got {:?}", err);
}

#[tokio::test]
async fn silent_endpoint_times_out_as_network_failure() {
    let mut config = test_config(&serve_silent().await, false);
    config.timeout = 1;

    let start = std::time::Instant::now();
    let err = run_pipeline(
        region(),
        &config,
        Arc::new(FakeCapture::new()),
        FixedOcr::text("text"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::NetworkFailed(_)), "got {:?}", err);
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn capture_failure_is_reported_as_is() {
    let server = serve(200, SUCCESS_BODY).await;
    let config = test_config(&server.url, false);

    let err = run_pipeline(
        region(),
        &config,
        Arc::new(FailingCapture),
        FixedOcr::text("text"),
    )
    .await
    .unwrap_err();

    assert_eq!(err, PipelineError::CaptureFailed("empty screenshot".to_string()));
    assert_eq!(server.request_count(), 0);
}
