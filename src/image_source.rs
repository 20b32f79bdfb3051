use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use tokio::sync::Mutex;

use crate::error::StudioError;

/// Предел размера загружаемой картинки
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Допустимые `src`: пусто, http(s) URL или `data:image/...`.
/// Локальные пути не принимаются.
pub fn is_supported_source(src: &str) -> bool {
    let src = src.trim();
    src.is_empty() || is_remote(src) || src.starts_with("data:image/")
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Превращает `src` встроенной картинки в самодостаточный data URI,
/// чтобы превью растеризовалось без внешних ссылок.
pub struct ImageResolver {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
    // последний загруженный src и его data URI
    cache: Mutex<Option<(String, String)>>,
}

impl ImageResolver {
    pub fn new(timeout: Duration) -> Self {
        Self::with_limit(timeout, MAX_IMAGE_BYTES)
    }

    pub fn with_limit(timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            max_bytes,
            cache: Mutex::new(None),
        }
    }

    pub async fn resolve(&self, src: &str) -> Result<Option<String>, StudioError> {
        let src = src.trim();
        if src.is_empty() {
            return Ok(None);
        }
        if !is_supported_source(src) {
            return Err(StudioError::UnsupportedImageSource(src.to_string()));
        }
        if src.starts_with("data:") {
            return Ok(Some(src.to_string()));
        }

        let mut cache = self.cache.lock().await;
        if let Some((cached_src, data_uri)) = cache.as_ref() {
            if cached_src == src {
                return Ok(Some(data_uri.clone()));
            }
        }

        let (bytes, declared_mime) = self.fetch(src).await?;

        let mime = declared_mime
            .filter(|m| m.starts_with("image/"))
            .or_else(|| sniff_mime(&bytes).map(str::to_string))
            .unwrap_or_else(|| "image/png".to_string());

        let data_uri = format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(&bytes));
        log::debug!("Resolved embedded image {} ({} bytes, {})", src, bytes.len(), mime);

        *cache = Some((src.to_string(), data_uri.clone()));
        Ok(Some(data_uri))
    }

    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>), StudioError> {
        let mut response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes as u64 {
                return Err(StudioError::ImageTooLarge { limit: self.max_bytes });
            }
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        // Content-Length может отсутствовать или врать, считаем сами
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(StudioError::ImageTooLarge { limit: self.max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok((bytes, mime))
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}
