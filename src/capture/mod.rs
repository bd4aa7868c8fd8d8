//! Screen capture domain: public API.
//!
//! This module owns all screen capture functionality.
//! External code should only use the types and functions exported here.

mod detect;
mod region;
mod screenshot;

pub use detect::{detect_strategy, CaptureStrategy};
pub use region::{
    crop_to_png_bytes, logical_monitor_rect, to_physical, to_physical_on_monitor, CaptureRegion,
    PixelRect,
};
pub use screenshot::ScreenCapture;

use crate::error::PipelineError;

/// Encoded screenshot handed from capture to the mode encoder.
///
/// Lives for a single pipeline run and is never persisted.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub format: image::ImageFormat,
}

impl CapturedImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: image::ImageFormat::Png,
        }
    }
}

/// Source of region screenshots.
///
/// Implementations block; the scheduler calls them off the async runtime.
pub trait CaptureProvider: Send + Sync {
    fn capture(&self, region: CaptureRegion) -> Result<CapturedImage, PipelineError>;
}
