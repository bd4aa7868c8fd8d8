//! Shared test helpers: fake capture/OCR providers and a canned HTTP endpoint.

#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use screen_translator_lib::capture::{CaptureProvider, CaptureRegion, CapturedImage};
use screen_translator_lib::error::PipelineError;
use screen_translator_lib::ocr::TextRecognizer;
use screen_translator_lib::Config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const SUCCESS_BODY: &str = r#"{
    "id": "chatcmpl-test",
    "object": "chat.completion",
    "choices": [{"index": 0, "message": {"role": "assistant", "content": "你好，世界"}, "finish_reason": "stop"}],
    "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
}"#;

/// Semi-transparent RGBA screenshot encoded as PNG.
pub fn rgba_png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 200])));
    let mut png = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    png
}

pub fn region() -> CaptureRegion {
    CaptureRegion::new(10, 20, 64, 32)
}

/// Config pointed at `api_base` with a test key.
pub fn test_config(api_base: &str, advanced_mode: bool) -> Config {
    Config {
        api_base: api_base.to_string(),
        api_key: "sk-test".to_string(),
        model: "gpt-4o-mini".to_string(),
        timeout: 5,
        region: region().to_config(),
        custom_prompt: "Translate:".to_string(),
        advanced_mode,
        ..Config::default()
    }
}

/// Returns the same PNG for every region and counts calls.
pub struct FakeCapture {
    png: Vec<u8>,
    pub calls: AtomicUsize,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self {
            png: rgba_png(64, 32),
            calls: AtomicUsize::new(0),
        }
    }
}

impl CaptureProvider for FakeCapture {
    fn capture(&self, _region: CaptureRegion) -> Result<CapturedImage, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CapturedImage::png(self.png.clone()))
    }
}

/// Blocks each capture until the test sends a release token.
pub struct GatedCapture {
    gate: Mutex<std::sync::mpsc::Receiver<()>>,
    png: Vec<u8>,
    pub calls: AtomicUsize,
}

impl GatedCapture {
    pub fn new() -> (Self, std::sync::mpsc::Sender<()>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (
            Self {
                gate: Mutex::new(rx),
                png: rgba_png(64, 32),
                calls: AtomicUsize::new(0),
            },
            tx,
        )
    }
}

impl CaptureProvider for GatedCapture {
    fn capture(&self, _region: CaptureRegion) -> Result<CapturedImage, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate
            .lock()
            .unwrap()
            .recv()
            .map_err(|e| PipelineError::CaptureFailed(e.to_string()))?;
        Ok(CapturedImage::png(self.png.clone()))
    }
}

pub struct FailingCapture;

impl CaptureProvider for FailingCapture {
    fn capture(&self, _region: CaptureRegion) -> Result<CapturedImage, PipelineError> {
        Err(PipelineError::CaptureFailed("empty screenshot".to_string()))
    }
}

pub struct PanickingCapture;

impl CaptureProvider for PanickingCapture {
    fn capture(&self, _region: CaptureRegion) -> Result<CapturedImage, PipelineError> {
        panic!("display server went away");
    }
}

/// OCR stub returning a fixed result.
pub struct FixedOcr(pub Result<String, String>);

impl FixedOcr {
    pub fn text(text: &str) -> Arc<Self> {
        Arc::new(Self(Ok(text.to_string())))
    }
}

impl TextRecognizer for FixedOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, String> {
        self.0.clone()
    }
}

/// One request as seen by the canned endpoint.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request line plus headers, as sent.
    pub head: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Local HTTP endpoint answering every request with one canned response.
pub struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Start a server that answers `status` with `body` to every request.
pub async fn serve(status: u16, body: &str) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let body = body.to_string();

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let recorded = recorded.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 8192];
                let header_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(end) = find_header_end(&buf) {
                        break end;
                    }
                };
                let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
                let wanted = header_end + content_length(&head);
                while buf.len() < wanted {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                recorded.lock().unwrap().push(RecordedRequest {
                    head,
                    body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
                });

                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockServer {
        url: format!("http://{}", addr),
        requests,
    }
}

/// Start a server that accepts connections and never answers.
pub async fn serve_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

/// An address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
