//! Pipeline failure taxonomy.
//!
//! Every stage reports through `PipelineError`. Nothing here is fatal to
//! the process: the scheduler turns each variant into a user-facing
//! message and goes back to idle. No variant is retried automatically.

use crate::i18n::{Language, MessageKey};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("image decode failed: {0}")]
    ImageDecodeFailed(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("OCR found no text")]
    OcrEmpty,

    #[error("no API key configured")]
    MissingApiKey,

    #[error("network request failed: {0}")]
    NetworkFailed(String),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("could not parse API response: {0}")]
    ParseFailed(String),

    #[error("pipeline worker panicked: {0}")]
    WorkerPanicked(String),
}

impl PipelineError {
    fn message_key(&self) -> MessageKey {
        match self {
            PipelineError::CaptureFailed(_) => MessageKey::ScreenshotFail,
            PipelineError::ImageDecodeFailed(_) => MessageKey::ImageError,
            PipelineError::OcrFailed(_) => MessageKey::OcrError,
            PipelineError::OcrEmpty => MessageKey::OcrEmpty,
            PipelineError::MissingApiKey => MessageKey::ApiKeyMissing,
            PipelineError::NetworkFailed(_) => MessageKey::NetError,
            PipelineError::ApiError { .. } => MessageKey::ApiError,
            PipelineError::ParseFailed(_) => MessageKey::ParseError,
            PipelineError::WorkerPanicked(_) => MessageKey::InternalError,
        }
    }

    /// Text for the failure callback, in the configured language.
    ///
    /// The localised prefix is followed by the underlying cause where there
    /// is one. API errors keep the provider's status and message verbatim.
    pub fn user_message(&self, lang: Language) -> String {
        let prefix = lang.tr(self.message_key());
        match self {
            PipelineError::OcrEmpty | PipelineError::MissingApiKey => prefix.to_string(),
            PipelineError::ApiError { status, message } => {
                format!("{} ({}): {}", prefix, status, message)
            }
            PipelineError::CaptureFailed(cause)
            | PipelineError::ImageDecodeFailed(cause)
            | PipelineError::OcrFailed(cause)
            | PipelineError::NetworkFailed(cause)
            | PipelineError::ParseFailed(cause)
            | PipelineError::WorkerPanicked(cause) => format!("{}: {}", prefix, cause),
        }
    }
}
