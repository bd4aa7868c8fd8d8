/// How a region screenshot is taken on the current host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStrategy {
    /// Ask the windowing system for the region directly.
    NativeGrab,
    /// Grab the whole monitor in physical pixels, then scale and crop.
    DesktopCrop,
}

/// Pick the capture strategy for this platform.
///
/// Windows grabs the region directly after converting it to physical
/// pixels. Elsewhere the native path is unreliable under scaling, so the
/// desktop grab is used.
pub fn detect_strategy() -> CaptureStrategy {
    strategy_for(std::env::consts::OS)
}

/// Pure mapping from OS name, separated for testability.
fn strategy_for(os: &str) -> CaptureStrategy {
    match os {
        "windows" => CaptureStrategy::NativeGrab,
        _ => CaptureStrategy::DesktopCrop,
    }
}
