use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub studio: StudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    pub quiet_interval_ms: u64,
    pub download_filename: String,
    pub notification_ttl_secs: u64,
    pub image_fetch_timeout_secs: u64,
    pub clipboard: ClipboardBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardBackend {
    System,
    Disabled,
}

impl ClipboardBackend {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "disabled" | "none" => Ok(Self::Disabled),
            other => anyhow::bail!("Unknown clipboard backend: {}", other),
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            quiet_interval_ms: 300,
            download_filename: "qrcode.png".to_string(),
            notification_ttl_secs: 3,
            image_fetch_timeout_secs: 5,
            clipboard: ClipboardBackend::System,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        // .env необязателен
        dotenv::dotenv().ok();

        let defaults = StudioConfig::default();

        // Загружаем из переменных окружения или используем дефолты
        let config = Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3001".to_string())
                    .parse()
                    .unwrap_or(3001),
            },
            studio: StudioConfig {
                quiet_interval_ms: env::var("QUIET_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.quiet_interval_ms),

                download_filename: env::var("DOWNLOAD_FILENAME")
                    .unwrap_or(defaults.download_filename),

                notification_ttl_secs: env::var("NOTIFICATION_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.notification_ttl_secs),

                image_fetch_timeout_secs: env::var("IMAGE_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.image_fetch_timeout_secs),

                clipboard: match env::var("CLIPBOARD") {
                    Ok(raw) => ClipboardBackend::parse(&raw)?,
                    Err(_) => defaults.clipboard,
                },
            },
        };

        // Валидация конфигурации
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.studio.quiet_interval_ms == 0 {
            anyhow::bail!("Quiet interval must be positive");
        }

        if self.studio.notification_ttl_secs == 0 {
            anyhow::bail!("Notification TTL must be positive");
        }

        let filename = self.studio.download_filename.trim();
        if filename.is_empty() {
            anyhow::bail!("Download filename must not be empty");
        }
        if !filename.to_ascii_lowercase().ends_with(".png") {
            anyhow::bail!("Download filename must end with .png, got {}", filename);
        }

        Ok(())
    }
}
