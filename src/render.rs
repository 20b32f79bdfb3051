use std::fmt::Write as _;

use qrcode::QrCode;
use serde::Serialize;

use crate::color::parse_rgba;
use crate::error::StudioError;
use crate::settings::QrOptions;

/// Отрендеренное превью: разметка и собственный размер
#[derive(Debug, Clone, Serialize)]
pub struct VectorPreview {
    pub version: u64,
    pub width: u32,
    pub height: u32,
    pub svg: String,
}

/// Положение встроенной картинки в координатах модулей (без полей)
#[derive(Debug, Clone, Copy, PartialEq)]
struct ImageBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl ImageBox {
    fn excavation(&self) -> (usize, usize, usize, usize) {
        let x0 = self.x.floor().max(0.0);
        let y0 = self.y.floor().max(0.0);
        let w = (self.w + self.x - x0).ceil().max(0.0);
        let h = (self.h + self.y - y0).ceil().max(0.0);
        (x0 as usize, y0 as usize, w as usize, h as usize)
    }
}

/// Сгенерировать SVG для снапшота.
///
/// `image_href` это уже проверенная ссылка на встроенную картинку, обычно data URI.
/// Без неё элемент `<image>` не выводится, но вырезка под картинку зависит
/// только от `excavate`.
pub fn render_svg(options: &QrOptions, image_href: Option<&str>) -> Result<String, StudioError> {
    let code = QrCode::with_error_correction_level(options.content.as_bytes(), options.level.into())?;

    let modules = code.width();
    let margin = options.margin as usize;
    let cells = modules + 2 * margin;
    let size = options.size.max(1);

    let image = image_box(options, modules, cells, size);

    let excavated = options
        .image_settings
        .excavate
        .then(|| image.excavation());

    let mut path = String::new();
    for y in 0..modules {
        let mut x = 0;
        while x < modules {
            if !is_dark(&code, x, y, excavated) {
                x += 1;
                continue;
            }
            // сливаем подряд идущие тёмные модули в одну полосу
            let start = x;
            while x < modules && is_dark(&code, x, y, excavated) {
                x += 1;
            }
            let _ = write!(
                path,
                "M{},{}h{}v1H{}z",
                start + margin,
                y + margin,
                x - start,
                start + margin
            );
        }
    }

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {cells} {cells}" shape-rendering="crispEdges">"#
    );

    if !options.has_transparent_background() && !is_invisible(&options.background) {
        let _ = write!(
            svg,
            r#"<path fill="{}" d="M0,0 h{cells}v{cells}H0z"/>"#,
            escape_xml(&options.background)
        );
    }

    let _ = write!(svg, r#"<path fill="{}" d="{}"/>"#, escape_xml(&options.foreground), path);

    if let Some(href) = image_href.filter(|h| !h.trim().is_empty()) {
        let _ = write!(
            svg,
            r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none"/>"#,
            escape_xml(href),
            image.x + margin as f64,
            image.y + margin as f64,
            image.w,
            image.h
        );
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Размер 0 означает десятую часть стороны кода
fn image_box(options: &QrOptions, modules: usize, cells: usize, size: u32) -> ImageBox {
    let fallback = size / 10;
    let pixels = |v: u32| if v == 0 { fallback } else { v };

    let scale = cells as f64 / size as f64;
    let w = pixels(options.image_settings.width) as f64 * scale;
    let h = pixels(options.image_settings.height) as f64 * scale;
    ImageBox {
        x: modules as f64 / 2.0 - w / 2.0,
        y: modules as f64 / 2.0 - h / 2.0,
        w,
        h,
    }
}

fn is_dark(code: &QrCode, x: usize, y: usize, excavated: Option<(usize, usize, usize, usize)>) -> bool {
    if let Some((ex, ey, ew, eh)) = excavated {
        if x >= ex && x < ex + ew && y >= ey && y < ey + eh {
            return false;
        }
    }
    code[(x, y)] == qrcode::Color::Dark
}

fn is_invisible(color: &str) -> bool {
    matches!(parse_rgba(color), Some([_, _, _, 0]))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
