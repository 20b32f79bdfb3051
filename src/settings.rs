use serde::{Deserialize, Serialize};

use crate::color::{ColorInput, DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, TRANSPARENT};

pub const DEFAULT_CONTENT: &str = "https://szy-allen.com";
pub const DEFAULT_MARGIN: u32 = 4;
pub const DEFAULT_IMAGE_SIZE: u32 = 24;

/// Полный набор параметров рендера
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrOptions {
    pub content: String,
    pub size: u32,
    pub foreground: String,
    pub background: String,
    pub level: ErrorCorrectionLevel,
    pub margin: u32,
    pub image_settings: ImageSettings,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            content: DEFAULT_CONTENT.to_string(),
            size: SizePreset::Small.pixels(),
            foreground: DEFAULT_FOREGROUND.to_string(),
            background: TRANSPARENT.to_string(),
            level: ErrorCorrectionLevel::M,
            margin: DEFAULT_MARGIN,
            image_settings: ImageSettings::default(),
        }
    }
}

impl QrOptions {
    pub fn has_transparent_background(&self) -> bool {
        self.background == TRANSPARENT
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub excavate: bool,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            src: String::new(),
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            excavate: false,
        }
    }
}

impl ImageSettings {
    /// Сброс при выключении встраивания. excavate здесь true, в отличие от начального состояния.
    pub fn disabled() -> Self {
        Self {
            excavate: true,
            ..Self::default()
        }
    }

    pub fn is_embedded(&self) -> bool {
        !self.src.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    L,
    M,
    Q,
    H,
}

impl ErrorCorrectionLevel {
    /// Доля восстанавливаемых повреждений, %
    pub fn recovery_percent(self) -> u8 {
        match self {
            Self::L => 7,
            Self::M => 15,
            Self::Q => 25,
            Self::H => 30,
        }
    }
}

impl From<ErrorCorrectionLevel> for qrcode::EcLevel {
    fn from(level: ErrorCorrectionLevel) -> Self {
        match level {
            ErrorCorrectionLevel::L => qrcode::EcLevel::L,
            ErrorCorrectionLevel::M => qrcode::EcLevel::M,
            ErrorCorrectionLevel::Q => qrcode::EcLevel::Q,
            ErrorCorrectionLevel::H => qrcode::EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    Small,
    Medium,
    Large,
}

impl SizePreset {
    pub const ALL: [SizePreset; 3] = [SizePreset::Small, SizePreset::Medium, SizePreset::Large];

    pub fn pixels(self) -> u32 {
        match self {
            Self::Small => 128,
            Self::Medium => 256,
            Self::Large => 512,
        }
    }

    pub fn from_pixels(pixels: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.pixels() == pixels)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    Preset,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForegroundMode {
    Default,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    #[serde(alias = "none")]
    Transparent,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    Default,
    Custom,
}

/// Состояние виджетов формы, в снапшот не входит
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormModes {
    pub size: SizeMode,
    pub foreground: ForegroundMode,
    pub background: BackgroundMode,
    pub margin: MarginMode,
    pub embed_image: bool,
    pub show_more_options: bool,
}

impl Default for FormModes {
    fn default() -> Self {
        Self {
            size: SizeMode::Preset,
            foreground: ForegroundMode::Default,
            background: BackgroundMode::Transparent,
            margin: MarginMode::Default,
            embed_image: false,
            show_more_options: false,
        }
    }
}

/// Последние пользовательские цвета, восстанавливаются при возврате в режим custom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorHistory {
    pub last_custom_foreground: String,
    pub last_custom_background: String,
}

impl Default for ColorHistory {
    fn default() -> Self {
        Self {
            last_custom_foreground: DEFAULT_FOREGROUND.to_string(),
            last_custom_background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

/// Изменения полей от одного действия пользователя
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldChanges {
    pub content: Option<String>,
    pub size_mode: Option<SizeMode>,
    pub size: Option<u32>,
    pub foreground_mode: Option<ForegroundMode>,
    pub foreground: Option<ColorInput>,
    pub background_mode: Option<BackgroundMode>,
    pub background: Option<ColorInput>,
    pub level: Option<ErrorCorrectionLevel>,
    pub margin_mode: Option<MarginMode>,
    pub margin: Option<u32>,
    pub embed_image: Option<bool>,
    pub image_settings: Option<ImageChanges>,
    pub show_more_options: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageChanges {
    pub src: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub excavate: Option<bool>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
