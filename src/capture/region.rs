//! Region geometry and crop-to-PNG.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Screen rectangle chosen by the user, in logical (device-independent)
/// coordinates with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from the `[x, y, w, h]` array stored in the config file.
    pub fn from_config(raw: [i32; 4]) -> Self {
        Self::new(raw[0], raw[1], raw[2], raw[3])
    }

    pub fn to_config(self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// A region must have positive area before anything is captured.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Rectangle in physical pixels of a grabbed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Map a logical region onto a grabbed monitor image.
///
/// `origin` is the monitor's logical top-left, `scale` its pixel density
/// ratio, `bounds` the grabbed image size in physical pixels. The result is
/// clamped to the image; `None` when nothing of the region is on it.
pub fn to_physical(
    region: CaptureRegion,
    origin: (i32, i32),
    scale: f32,
    bounds: (u32, u32),
) -> Option<PixelRect> {
    let scale = effective_scale(scale);

    let left = ((region.x - origin.0) as f64 * scale).floor();
    let top = ((region.y - origin.1) as f64 * scale).floor();
    let right = ((region.x - origin.0 + region.width) as f64 * scale).ceil();
    let bottom = ((region.y - origin.1 + region.height) as f64 * scale).ceil();

    let left = left.max(0.0) as u32;
    let top = top.max(0.0) as u32;
    let right = right.clamp(0.0, bounds.0 as f64) as u32;
    let bottom = bottom.clamp(0.0, bounds.1 as f64) as u32;

    if right <= left || bottom <= top {
        return None;
    }

    Some(PixelRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

/// Logical `(x, y, width, height)` of a monitor whose geometry is reported
/// in physical pixels.
pub fn logical_monitor_rect(
    physical_origin: (i32, i32),
    scale: f32,
    physical_size: (u32, u32),
) -> (i32, i32, i32, i32) {
    let scale = effective_scale(scale);
    (
        (physical_origin.0 as f64 / scale).round() as i32,
        (physical_origin.1 as f64 / scale).round() as i32,
        (physical_size.0 as f64 / scale).round() as i32,
        (physical_size.1 as f64 / scale).round() as i32,
    )
}

/// Map a logical region onto a monitor that positions and crops in
/// physical pixels, such as xcap's Windows backend.
///
/// The monitor origin is converted to logical coordinates first, so the
/// offset and the size are both scaled once.
pub fn to_physical_on_monitor(
    region: CaptureRegion,
    physical_origin: (i32, i32),
    scale: f32,
    physical_size: (u32, u32),
) -> Option<PixelRect> {
    let (x, y, _, _) = logical_monitor_rect(physical_origin, scale, physical_size);
    to_physical(region, (x, y), scale, physical_size)
}

fn effective_scale(scale: f32) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale as f64
    } else {
        1.0
    }
}

/// Crop `image` to the rectangle and encode the result as PNG in memory.
pub fn crop_to_png_bytes(
    image: &DynamicImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, image::ImageError> {
    let cropped = image.crop_imm(x, y, width, height);
    encode_png(&cropped)
}

pub(super) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png_bytes = Vec::new();
    image.write_to(
        &mut std::io::Cursor::new(&mut png_bytes),
        image::ImageFormat::Png,
    )?;
    Ok(png_bytes)
}
