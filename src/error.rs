use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("SVG parsing failed: {0}")]
    SvgParse(#[from] resvg::usvg::Error),

    #[error("Failed to allocate {width}x{height} bitmap")]
    Bitmap { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),

    #[error("Malformed data URI: {0}")]
    DataUri(String),

    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Unsupported image source: {0}")]
    UnsupportedImageSource(String),

    #[error("Image exceeds {limit} bytes")]
    ImageTooLarge { limit: usize },

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Ошибка валидации поля формы
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
