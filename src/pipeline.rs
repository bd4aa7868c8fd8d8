//! Core capture-to-translation pipeline.
//!
//! - run_pipeline: capture → encode (OCR or vision) → chat completion
//! - PipelineScheduler: single-flight runner that publishes one terminal
//!   event per accepted trigger
//!
//! The caller (tray, hotkey, CLI) owns the foreground. Blocking stages run
//! on tokio's blocking pool; the HTTP call is async. Nothing here touches
//! UI state: results leave only through the event channel.

use crate::capture::{CaptureProvider, CaptureRegion};
use crate::config::Config;
use crate::error::PipelineError;
use crate::i18n::{Language, MessageKey};
use crate::llm::{self, TokenUsage, TranslationResult};
use crate::ocr::TextRecognizer;
use crate::usage::UsageAccountant;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Run every stage once for `region` using the `config` snapshot.
pub async fn run_pipeline(
    region: CaptureRegion,
    config: &Config,
    capture: Arc<dyn CaptureProvider>,
    ocr: Arc<dyn TextRecognizer>,
) -> Result<TranslationResult, PipelineError> {
    let pipeline_start = std::time::Instant::now();

    // Stage 1: capture → PNG bytes
    let captured = tokio::task::spawn_blocking(move || capture.capture(region))
        .await
        .map_err(|e| PipelineError::WorkerPanicked(format!("capture: {}", e)))??;
    let capture_ms = pipeline_start.elapsed().as_millis();

    // Stage 2: decode → OCR text or vision parts
    let encode_start = std::time::Instant::now();
    let encode_config = config.clone();
    let messages = tokio::task::spawn_blocking(move || {
        llm::encode(&captured.bytes, &encode_config, ocr.as_ref())
    })
    .await
    .map_err(|e| PipelineError::WorkerPanicked(format!("encode: {}", e)))??;
    let encode_ms = encode_start.elapsed().as_millis();

    // Stage 3: chat completion
    let api_start = std::time::Instant::now();
    let result = llm::send(messages, config).await?;
    let api_ms = api_start.elapsed().as_millis();

    log::info!(
        "[PIPELINE] Total: {}ms (capture={} + encode={} + api={})",
        pipeline_start.elapsed().as_millis(),
        capture_ms,
        encode_ms,
        api_ms
    );
    Ok(result)
}

/// Terminal outcome of one accepted trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Succeeded { text: String, usage: TokenUsage },
    Failed { error: PipelineError, message: String },
}

/// Why a trigger was not accepted. No event follows a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TriggerRejected {
    #[error("previous task in progress")]
    Busy,
    #[error("no region configured")]
    NoRegion,
}

impl TriggerRejected {
    pub fn user_message(&self, lang: Language) -> &'static str {
        match self {
            TriggerRejected::Busy => lang.tr(MessageKey::PrevTask),
            TriggerRejected::NoRegion => lang.tr(MessageKey::NoRegion),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Clears the running flag when dropped, whichever way the worker exits.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-flight pipeline runner.
///
/// At most one run is in flight. Overlapping triggers are rejected, never
/// queued, and the in-flight run is never cancelled.
pub struct PipelineScheduler {
    runtime: Handle,
    running: Arc<AtomicBool>,
    capture: Arc<dyn CaptureProvider>,
    ocr: Arc<dyn TextRecognizer>,
    usage: Arc<UsageAccountant>,
    events: mpsc::UnboundedSender<PipelineEvent>,
}

impl PipelineScheduler {
    /// Returns the scheduler and the receiving end of its event channel.
    pub fn new(
        runtime: Handle,
        capture: Arc<dyn CaptureProvider>,
        ocr: Arc<dyn TextRecognizer>,
        usage: Arc<UsageAccountant>,
    ) -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                runtime,
                running: Arc::new(AtomicBool::new(false)),
                capture,
                ocr,
                usage,
                events,
            },
            rx,
        )
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Start a run for `region` with this `config` snapshot.
    ///
    /// The flag is taken with a compare-exchange, so two racing triggers
    /// can never both start a worker.
    pub fn trigger(&self, region: CaptureRegion, config: Config) -> Result<(), TriggerRejected> {
        if self.running.load(Ordering::Acquire) {
            log::info!("[PIPELINE] Trigger rejected: previous task in progress");
            return Err(TriggerRejected::Busy);
        }
        if !region.is_valid() {
            log::info!("[PIPELINE] Trigger rejected: no region configured");
            return Err(TriggerRejected::NoRegion);
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::info!("[PIPELINE] Trigger rejected: lost race to another trigger");
            return Err(TriggerRejected::Busy);
        }

        let guard = RunningGuard(self.running.clone());
        let capture = self.capture.clone();
        let ocr = self.ocr.clone();
        let usage = self.usage.clone();
        let events = self.events.clone();
        let lang = config.language;

        log::info!(
            "[PIPELINE] Accepted trigger: {{x: {}, y: {}, w: {}, h: {}}}, mode={}",
            region.x,
            region.y,
            region.width,
            region.height,
            if config.advanced_mode { "vision" } else { "ocr" }
        );

        self.runtime.spawn(async move {
            // Inner task so a panic in any stage still yields an outcome.
            let worker = tokio::spawn(async move {
                run_pipeline(region, &config, capture, ocr).await
            });
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(e) => Err(PipelineError::WorkerPanicked(e.to_string())),
            };

            let event = match outcome {
                Ok(result) => {
                    let tokens = result.usage;
                    // Ledger persistence is file I/O.
                    let recorded = tokio::task::spawn_blocking(move || {
                        usage.record(tokens.input_tokens, tokens.output_tokens)
                    })
                    .await;
                    if let Err(e) = recorded {
                        log::error!("[USAGE] Recording usage failed: {}", e);
                    }
                    PipelineEvent::Succeeded {
                        text: result.text,
                        usage: result.usage,
                    }
                }
                Err(error) => {
                    log::warn!("[PIPELINE] Run failed: {}", error);
                    let message = error.user_message(lang);
                    PipelineEvent::Failed { error, message }
                }
            };

            // Back to idle before publishing, so a subscriber reacting to
            // the event can trigger again straight away.
            drop(guard);
            if events.send(event).is_err() {
                log::warn!("[PIPELINE] No subscriber for pipeline outcome");
            }
        });

        Ok(())
    }
}
