//! Localised outcome messages.
//!
//! Only the strings the pipeline hands back to the UI layer live here:
//! rejection signals and failure messages. Everything else the UI shows
//! is the UI's business.

use serde::{Deserialize, Serialize};

/// Display language selected in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh_CN")]
    ZhCn,
    #[serde(rename = "en_US")]
    EnUs,
}

/// Message keys for pipeline outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    NoRegion,
    PrevTask,
    ScreenshotFail,
    OcrEmpty,
    ApiKeyMissing,
    NetError,
    ImageError,
    OcrError,
    ApiError,
    ParseError,
    InternalError,
}

impl Language {
    pub fn tr(self, key: MessageKey) -> &'static str {
        match self {
            Language::ZhCn => match key {
                MessageKey::NoRegion => "请先设置监控区域",
                MessageKey::PrevTask => "上个任务进行中...",
                MessageKey::ScreenshotFail => "截图失败",
                MessageKey::OcrEmpty => "未识别到文字",
                MessageKey::ApiKeyMissing => "错误: 未配置 API Key",
                MessageKey::NetError => "网络连接失败",
                MessageKey::ImageError => "图像数据错误",
                MessageKey::OcrError => "OCR 错误",
                MessageKey::ApiError => "API 错误",
                MessageKey::ParseError => "响应解析失败",
                MessageKey::InternalError => "内部错误",
            },
            Language::EnUs => match key {
                MessageKey::NoRegion => "Please set region first",
                MessageKey::PrevTask => "Task in progress...",
                MessageKey::ScreenshotFail => "Screenshot failed",
                MessageKey::OcrEmpty => "No text detected",
                MessageKey::ApiKeyMissing => "Error: API Key missing",
                MessageKey::NetError => "Network connection failed",
                MessageKey::ImageError => "Image data error",
                MessageKey::OcrError => "OCR error",
                MessageKey::ApiError => "API error",
                MessageKey::ParseError => "Parse error",
                MessageKey::InternalError => "Internal error",
            },
        }
    }
}
