//! Растеризация превью в PNG.
//!
//! SVG разметка кодируется в data URI, декодируется обратно в документ,
//! рисуется в битмап собственного размера и кодируется в PNG.

use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};
use resvg::{tiny_skia, usvg};

use crate::error::StudioError;

const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

pub struct RasterImage {
    pub pixels: RgbaImage,
    pub png: Vec<u8>,
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

pub fn svg_data_uri(svg: &str) -> String {
    format!("{}{}", SVG_DATA_URI_PREFIX, general_purpose::STANDARD.encode(svg.as_bytes()))
}

pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, StudioError> {
    let (header, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| StudioError::DataUri("missing data: header".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(StudioError::DataUri(format!("unsupported encoding in {}", header)));
    }

    Ok(general_purpose::STANDARD.decode(payload)?)
}

/// Синхронная и CPU-тяжёлая, вызывать через `spawn_blocking`
pub fn rasterize(svg: &str) -> Result<RasterImage, StudioError> {
    let data = decode_data_uri(&svg_data_uri(svg))?;

    let tree = usvg::Tree::from_data(&data, &raster_options())?;
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(StudioError::Bitmap { width, height })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // tiny_skia хранит премультиплицированный альфа
    let raw: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    let pixels = RgbaImage::from_raw(width, height, raw)
        .ok_or(StudioError::Bitmap { width, height })?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        pixels.as_raw(),
        width,
        height,
        image::ColorType::Rgba8,
    )?;

    Ok(RasterImage { pixels, png })
}

/// Картинки берутся только из data URI, ссылки на файлы и URL игнорируются
fn raster_options() -> usvg::Options<'static> {
    let mut options = usvg::Options::default();
    options.image_href_resolver = usvg::ImageHrefResolver {
        resolve_data: usvg::ImageHrefResolver::default_data_resolver(),
        resolve_string: Box::new(|_: &str, _: &usvg::Options| None),
    };
    options
}
