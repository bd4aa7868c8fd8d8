//! Turns a captured screenshot into the request's `messages`.
//!
//! OCR mode extracts text locally and sends only text. Vision mode embeds
//! the image as a base64 JPEG data URI next to the prompt. The mode is a
//! straight switch on `advanced_mode`: a failing vision encode never falls
//! back to OCR, or the other way round.

use super::types::{ChatMessage, ContentPart, ImageUrl, MessageContent};
use crate::config::Config;
use crate::error::PipelineError;
use crate::ocr::TextRecognizer;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};

/// Lossy quality for images sent to vision models.
pub const JPEG_QUALITY: u8 = 85;

/// Build the message list for one pipeline run.
pub fn encode(
    image_bytes: &[u8],
    config: &Config,
    ocr: &dyn TextRecognizer,
) -> Result<Vec<ChatMessage>, PipelineError> {
    let image = decode_image(image_bytes)?;

    let message = if config.advanced_mode {
        log::info!("[ENCODE] Vision mode");
        build_vision_message(&config.custom_prompt, image)?
    } else {
        log::info!("[ENCODE] OCR mode");
        let text = extract_text(&image, ocr)?;
        build_ocr_message(&config.custom_prompt, &text)
    };

    Ok(vec![message])
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    image::load_from_memory(bytes).map_err(|e| {
        log::error!("[ENCODE] Failed to decode captured image: {}", e);
        PipelineError::ImageDecodeFailed(e.to_string())
    })
}

/// Run OCR and trim. Blank output is `OcrEmpty`, an engine error is `OcrFailed`.
pub fn extract_text(image: &DynamicImage, ocr: &dyn TextRecognizer) -> Result<String, PipelineError> {
    let start = std::time::Instant::now();
    let raw = ocr.recognize(image).map_err(|e| {
        log::error!("[OCR] Engine error: {}", e);
        PipelineError::OcrFailed(e)
    })?;

    let text = raw.trim();
    log::info!(
        "[OCR] {} chars after trim in {}ms",
        text.chars().count(),
        start.elapsed().as_millis()
    );
    if text.is_empty() {
        return Err(PipelineError::OcrEmpty);
    }
    Ok(text.to_string())
}

pub fn build_ocr_message(prompt: &str, text: &str) -> ChatMessage {
    ChatMessage::user(MessageContent::Text(format!("{}\n\n{}", prompt, text)))
}

pub fn build_vision_message(prompt: &str, image: DynamicImage) -> Result<ChatMessage, PipelineError> {
    let jpeg = encode_jpeg(flatten_for_jpeg(image))
        .map_err(|e| PipelineError::ImageDecodeFailed(format!("JPEG encode failed: {}", e)))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&jpeg);
    log::info!(
        "[ENCODE] JPEG q{}: {} bytes, {} base64 chars",
        JPEG_QUALITY,
        jpeg.len(),
        encoded.len()
    );

    Ok(ChatMessage::user(MessageContent::Parts(vec![
        ContentPart::Text {
            text: prompt.to_string(),
        },
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/jpeg;base64,{}", encoded),
            },
        },
    ])))
}

/// JPEG has no alpha channel and no palette; anything but 8-bit RGB or
/// grey is flattened to 8-bit RGB.
pub fn flatten_for_jpeg(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgb8 | ColorType::L8 => image,
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

pub fn encode_jpeg(image: DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut jpeg = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY))?;
    Ok(jpeg)
}
