use std::borrow::Cow;

use crate::config::ClipboardBackend;
use crate::error::StudioError;
use crate::export::RasterImage;

pub const PNG_MIME: &str = "image/png";

/// Куда пишется картинка в режиме копирования
pub trait ClipboardSink: Send + Sync {
    fn write_image(&self, image: &RasterImage, mime: &str) -> Result<(), StudioError>;
}

/// Системный буфер обмена через arboard
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_image(&self, image: &RasterImage, mime: &str) -> Result<(), StudioError> {
        // arboard принимает только RGBA пиксели, mime нужен для лога
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| StudioError::Clipboard(e.to_string()))?;

        let data = arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.pixels.as_raw()),
        };
        clipboard
            .set_image(data)
            .map_err(|e| StudioError::Clipboard(e.to_string()))?;

        log::debug!("Wrote {}x{} {} to system clipboard", image.width(), image.height(), mime);
        Ok(())
    }
}

/// Для машин без графической сессии: копирование всегда неудачно
pub struct DisabledClipboard;

impl ClipboardSink for DisabledClipboard {
    fn write_image(&self, _image: &RasterImage, _mime: &str) -> Result<(), StudioError> {
        Err(StudioError::Clipboard("clipboard is disabled".to_string()))
    }
}

pub fn from_backend(backend: ClipboardBackend) -> Box<dyn ClipboardSink> {
    match backend {
        ClipboardBackend::System => Box::new(SystemClipboard),
        ClipboardBackend::Disabled => Box::new(DisabledClipboard),
    }
}
