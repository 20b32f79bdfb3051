use crate::color::TRANSPARENT;
use crate::error::ValidationError;
use crate::image_source::is_supported_source;
use crate::settings::{FieldChanges, SizeMode, SizePreset};

pub const MAX_CONTENT_CHARS: usize = 200;
pub const MIN_SIZE: u32 = 32;
pub const MAX_SIZE: u32 = 1024;
pub const MAX_MARGIN: u32 = 100;
pub const MAX_IMAGE_SIZE: u32 = 100;

/// Проверка полей формы до нормализации. Собирает все ошибки, а не первую.
pub fn validate_changes(delta: &FieldChanges, size_mode: SizeMode) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(content) = &delta.content {
        let chars = content.chars().count();
        if chars == 0 {
            errors.push(ValidationError::new("content", "Content is required"));
        } else if chars > MAX_CONTENT_CHARS {
            errors.push(ValidationError::new(
                "content",
                format!("Content must not exceed {} characters", MAX_CONTENT_CHARS),
            ));
        }
    }

    if let Some(size) = delta.size {
        // режим из этого же изменения важнее текущего
        match delta.size_mode.unwrap_or(size_mode) {
            SizeMode::Preset if SizePreset::from_pixels(size).is_none() => {
                errors.push(ValidationError::new(
                    "size",
                    format!("Preset size must be one of 128, 256, 512, got {}", size),
                ));
            }
            SizeMode::Custom if !(MIN_SIZE..=MAX_SIZE).contains(&size) => {
                errors.push(ValidationError::new(
                    "size",
                    format!("Size must be between {} and {}", MIN_SIZE, MAX_SIZE),
                ));
            }
            _ => {}
        }
    }

    for (field, color) in [("foreground", &delta.foreground), ("background", &delta.background)] {
        match color {
            Some(c) if !c.is_valid() => {
                errors.push(ValidationError::new(field, "Color must be a hex value"));
            }
            // прозрачность выбирается режимом, а не пикером
            Some(c) if c.resolve() == TRANSPARENT => {
                errors.push(ValidationError::new(field, "Custom color must not be transparent"));
            }
            _ => {}
        }
    }

    if let Some(margin) = delta.margin {
        if margin > MAX_MARGIN {
            errors.push(ValidationError::new(
                "margin",
                format!("Margin must be between 0 and {}", MAX_MARGIN),
            ));
        }
    }

    if let Some(image) = &delta.image_settings {
        if matches!(&image.src, Some(src) if !is_supported_source(src)) {
            errors.push(ValidationError::new(
                "image_settings.src",
                "Image source must be an http(s) URL or a data:image URI",
            ));
        }

        for (field, value) in [("image_settings.width", image.width), ("image_settings.height", image.height)] {
            if matches!(value, Some(v) if v > MAX_IMAGE_SIZE) {
                errors.push(ValidationError::new(
                    field,
                    format!("Image size must be between 0 and {}", MAX_IMAGE_SIZE),
                ));
            }
        }
    }

    errors
}
