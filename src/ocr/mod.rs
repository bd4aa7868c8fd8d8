//! OCR domain: local text extraction.
//!
//! The engine is an opaque capability behind `TextRecognizer`. The shipped
//! implementation drives Tesseract through rusty-tesseract, configured for
//! mixed Simplified Chinese and Latin text.

use image::DynamicImage;

/// Tesseract language pack selection: Simplified Chinese plus English.
pub const OCR_LANGUAGES: &str = "chi_sim+eng";

/// Extracts text from a decoded image.
///
/// Returns the raw recognised text (untrimmed). `Err` means the engine
/// itself failed; finding no text is an `Ok` with blank content.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, String>;
}

/// Tesseract-backed recogniser.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    lang: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            lang: OCR_LANGUAGES.to_string(),
        }
    }
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_languages(lang: impl Into<String>) -> Self {
        Self { lang: lang.into() }
    }

    pub fn languages(&self) -> &str {
        &self.lang
    }

    /// Whether the `tesseract` executable can be found on PATH.
    pub fn is_available() -> bool {
        which::which("tesseract").is_ok()
    }
}

impl TextRecognizer for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, String> {
        if !Self::is_available() {
            return Err("tesseract executable not found on PATH".to_string());
        }

        let start = std::time::Instant::now();
        let input = rusty_tesseract::Image::from_dynamic_image(image).map_err(|e| e.to_string())?;
        let args = rusty_tesseract::Args {
            lang: self.lang.clone(),
            ..rusty_tesseract::Args::default()
        };
        let text = rusty_tesseract::image_to_string(&input, &args).map_err(|e| e.to_string())?;

        log::info!(
            "[OCR] Tesseract ({}) extracted {} chars in {}ms",
            self.lang,
            text.chars().count(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
