//! Screen Translator: capture-to-translation core.
//!
//! This crate wires together all domains. The UI layer (tray, floating
//! button, settings dialog, result overlay) lives elsewhere: it calls
//! `PipelineScheduler::trigger` and renders the `PipelineEvent`s.
//!
//! Modules:
//!   - capture/: platform-aware region screenshots → PNG
//!   - ocr/: local text extraction (Tesseract)
//!   - llm/: message encoding and the chat-completion call
//!   - pipeline.rs: stage orchestration + single-flight scheduler
//!   - config.rs, usage.rs: persisted settings and token ledger

pub mod capture;
pub mod config;
pub mod error;
pub mod i18n;
pub mod llm;
pub mod ocr;
pub mod pipeline;
pub mod usage;

pub use capture::{CaptureProvider, CaptureRegion, ScreenCapture};
pub use config::{Config, ConfigStore};
pub use error::PipelineError;
pub use ocr::{TesseractOcr, TextRecognizer};
pub use pipeline::{run_pipeline, PipelineEvent, PipelineScheduler, SchedulerState, TriggerRejected};
pub use usage::{UsageAccountant, UsageStats};

/// Load `.env.local`, then `.env`, from `dir`. The first file found wins.
///
/// Returns the path that was loaded, if any.
pub fn load_env(dir: &std::path::Path) -> Option<std::path::PathBuf> {
    for env_file in [".env.local", ".env"] {
        let path = dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            return Some(path);
        }
    }
    None
}

/// Initialise `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
