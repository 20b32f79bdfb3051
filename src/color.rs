use serde::{Deserialize, Serialize};

pub const TRANSPARENT: &str = "transparent";
pub const DEFAULT_FOREGROUND: &str = "#000000";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Всё, что умеет отдать себя в виде hex строки
pub trait ToHexString {
    fn to_hex_string(&self) -> String;
}

/// Цвет от виджета: либо строка, либо объект пикера с RGBA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    Raw(String),
    Rich(RichColor),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RichColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl ToHexString for RichColor {
    fn to_hex_string(&self) -> String {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        if alpha == u8::MAX {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, alpha)
        }
    }
}

impl ColorInput {
    /// Привести к канонической строке. Неразборчивые строки остаются как есть,
    /// их отсекает валидация формы.
    pub fn resolve(&self) -> String {
        match self {
            ColorInput::Raw(raw) => canonical_hex(raw).unwrap_or_else(|| raw.clone()),
            ColorInput::Rich(color) => color.to_hex_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            ColorInput::Raw(raw) => canonical_hex(raw).is_some(),
            ColorInput::Rich(color) => color.a.is_finite(),
        }
    }
}

/// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` -> `#rrggbb[aa]` в нижнем регистре.
/// `transparent` сохраняется.
pub fn canonical_hex(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(TRANSPARENT) {
        return Some(TRANSPARENT.to_string());
    }

    let digits = trimmed.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let digits = digits.to_ascii_lowercase();
    match digits.len() {
        3 | 4 => Some(digits.chars().fold(String::from("#"), |mut acc, c| {
            acc.push(c);
            acc.push(c);
            acc
        })),
        6 | 8 => Some(format!("#{}", digits)),
        _ => None,
    }
}

/// RGBA компоненты канонической hex строки
pub fn parse_rgba(hex: &str) -> Option<[u8; 4]> {
    let canonical = canonical_hex(hex)?;
    if canonical == TRANSPARENT {
        return Some([0, 0, 0, 0]);
    }

    let digits = &canonical[1..];
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let alpha = if digits.len() == 8 { channel(6)? } else { u8::MAX };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}
