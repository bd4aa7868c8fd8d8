//! Region screenshots via the xcap crate.
//!
//! The strategy is probed on every call (see `detect.rs`). Both paths end
//! in PNG bytes so downstream stages only ever see one format.

use super::detect::{detect_strategy, CaptureStrategy};
use super::region::{
    encode_png, logical_monitor_rect, to_physical, to_physical_on_monitor, CaptureRegion,
};
use super::{CaptureProvider, CapturedImage};
use crate::error::PipelineError;
use image::DynamicImage;
use xcap::Monitor;

/// Captures from the real screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenCapture;

impl ScreenCapture {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureProvider for ScreenCapture {
    fn capture(&self, region: CaptureRegion) -> Result<CapturedImage, PipelineError> {
        let start = std::time::Instant::now();
        let strategy = detect_strategy();
        log::info!(
            "[CAPTURE] Strategy: {:?}, region: {{x: {}, y: {}, w: {}, h: {}}}",
            strategy,
            region.x,
            region.y,
            region.width,
            region.height
        );

        let image = match strategy {
            CaptureStrategy::NativeGrab => native_grab(region),
            CaptureStrategy::DesktopCrop => desktop_crop(region),
        }
        .map_err(PipelineError::CaptureFailed)?;

        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::CaptureFailed("empty screenshot".to_string()));
        }

        let png_bytes = encode_png(&image)
            .map_err(|e| PipelineError::CaptureFailed(format!("PNG encode failed: {}", e)))?;
        log::info!(
            "[CAPTURE] {}x{} captured in {}ms ({} bytes)",
            image.width(),
            image.height(),
            start.elapsed().as_millis(),
            png_bytes.len()
        );

        Ok(CapturedImage::png(png_bytes))
    }
}

/// Monitor that contains the region's top-left corner.
fn monitor_for(region: CaptureRegion) -> Result<Monitor, String> {
    Monitor::from_point(region.x, region.y)
        .map_err(|e| format!("no monitor at ({}, {}): {}", region.x, region.y, e))
}

/// Monitor whose logical bounds contain the region's top-left corner, for
/// backends that report monitor geometry in physical pixels.
fn monitor_for_logical(region: CaptureRegion) -> Result<Monitor, String> {
    let monitors = Monitor::all().map_err(|e| e.to_string())?;
    for monitor in monitors {
        let origin = (
            monitor.x().map_err(|e| e.to_string())?,
            monitor.y().map_err(|e| e.to_string())?,
        );
        let size = (
            monitor.width().map_err(|e| e.to_string())?,
            monitor.height().map_err(|e| e.to_string())?,
        );
        let scale = monitor.scale_factor().map_err(|e| e.to_string())?;
        let (x, y, w, h) = logical_monitor_rect(origin, scale, size);
        if region.x >= x && region.x < x + w && region.y >= y && region.y < y + h {
            return Ok(monitor);
        }
    }
    Err(format!("no monitor at ({}, {})", region.x, region.y))
}

/// Ask the monitor for the region directly.
///
/// xcap positions and crops in physical pixels here, so the logical region
/// is converted with the monitor's scale factor first.
fn native_grab(region: CaptureRegion) -> Result<DynamicImage, String> {
    let monitor = monitor_for_logical(region)?;
    let mx = monitor.x().map_err(|e| e.to_string())?;
    let my = monitor.y().map_err(|e| e.to_string())?;
    let mw = monitor.width().map_err(|e| e.to_string())?;
    let mh = monitor.height().map_err(|e| e.to_string())?;
    let scale = monitor.scale_factor().map_err(|e| e.to_string())?;

    let rect = to_physical_on_monitor(region, (mx, my), scale, (mw, mh))
        .ok_or_else(|| "region lies outside the monitor".to_string())?;
    log::info!(
        "[CAPTURE] Native grab at scale {}: {{x: {}, y: {}, w: {}, h: {}}}",
        scale,
        rect.x,
        rect.y,
        rect.width,
        rect.height
    );

    let grabbed = monitor
        .capture_region(rect.x, rect.y, rect.width, rect.height)
        .map_err(|e| e.to_string())?;
    Ok(DynamicImage::ImageRgba8(grabbed))
}

/// Grab the whole monitor, convert the logical region to physical pixels
/// using the monitor's scale factor, then crop.
fn desktop_crop(region: CaptureRegion) -> Result<DynamicImage, String> {
    let monitor = monitor_for(region)?;
    let mx = monitor.x().map_err(|e| e.to_string())?;
    let my = monitor.y().map_err(|e| e.to_string())?;
    let scale = monitor.scale_factor().map_err(|e| e.to_string())?;

    let full = monitor.capture_image().map_err(|e| e.to_string())?;
    let full = DynamicImage::ImageRgba8(full);
    log::info!(
        "[CAPTURE] Desktop grab {}x{} at scale {}",
        full.width(),
        full.height(),
        scale
    );

    let rect = to_physical(region, (mx, my), scale, (full.width(), full.height()))
        .ok_or_else(|| "region lies outside the captured desktop".to_string())?;

    Ok(full.crop_imm(rect.x, rect.y, rect.width, rect.height))
}
