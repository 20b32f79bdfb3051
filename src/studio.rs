use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::clipboard::{ClipboardSink, PNG_MIME};
use crate::config::StudioConfig;
use crate::error::{StudioError, ValidationError};
use crate::export::{rasterize, RasterImage};
use crate::image_source::ImageResolver;
use crate::normalize::normalize;
use crate::notify::{Notification, NotificationLevel, Notifier};
use crate::publisher::DebouncedPublisher;
use crate::render::{render_svg, VectorPreview};
use crate::settings::{ColorHistory, FieldChanges, FormModes, QrOptions};
use crate::validate::validate_changes;

const COPY_SUCCESS: &str = "QR code copied to clipboard";
const COPY_FAILURE: &str = "Copy failed, please try again";

/// Состояние формы. Пишет только нормализатор.
#[derive(Debug, Clone, Default)]
struct FormState {
    draft: QrOptions,
    modes: FormModes,
    history: ColorHistory,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub values: QrOptions,
    pub modes: FormModes,
    pub history: ColorHistory,
}

impl From<&FormState> for FormView {
    fn from(state: &FormState) -> Self {
        Self {
            values: state.draft.clone(),
            modes: state.modes.clone(),
            history: state.history.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub export_id: String,
    pub success: bool,
    pub notification: Notification,
}

pub struct Download {
    pub export_id: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct StudioService {
    form: Arc<Mutex<FormState>>,
    publisher: Arc<DebouncedPublisher<QrOptions>>,
    preview: Arc<RwLock<Option<VectorPreview>>>,
    images: Arc<ImageResolver>,
    notifier: Arc<Notifier>,
    clipboard: Arc<dyn ClipboardSink>,
    config: StudioConfig,
}

impl StudioService {
    pub fn new(config: StudioConfig, clipboard: Arc<dyn ClipboardSink>) -> Self {
        let form = FormState::default();
        let publisher = DebouncedPublisher::new(
            form.draft.clone(),
            Duration::from_millis(config.quiet_interval_ms),
        );

        Self {
            form: Arc::new(Mutex::new(form)),
            publisher: Arc::new(publisher),
            preview: Arc::new(RwLock::new(None)),
            images: Arc::new(ImageResolver::new(Duration::from_secs(config.image_fetch_timeout_secs))),
            notifier: Arc::new(Notifier::new(chrono::Duration::seconds(
                config.notification_ttl_secs as i64,
            ))),
            clipboard,
            config,
        }
    }

    pub async fn form_view(&self) -> FormView {
        FormView::from(&*self.form.lock().await)
    }

    /// Принять изменения одного поля формы: валидация, нормализация,
    /// отложенная публикация
    pub async fn apply_changes(&self, delta: FieldChanges) -> Result<FormView, Vec<ValidationError>> {
        let mut form = self.form.lock().await;

        let errors = validate_changes(&delta, form.modes.size);
        if !errors.is_empty() {
            log::warn!("Rejected form changes: {} invalid field(s)", errors.len());
            return Err(errors);
        }

        if delta.is_empty() {
            return Ok(FormView::from(&*form));
        }

        let (draft, history) = normalize(&delta, &form.draft, &form.history);
        form.draft = draft;
        form.history = history;
        form.modes.apply(&delta);

        self.publisher.schedule(form.draft.clone());
        log::debug!("Form updated, publish scheduled");

        Ok(FormView::from(&*form))
    }

    pub fn published(&self) -> QrOptions {
        self.publisher.current()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifier.active().await
    }

    pub async fn preview(&self) -> Option<VectorPreview> {
        self.preview.read().await.clone()
    }

    /// Перерисовать превью по опубликованному снапшоту
    pub async fn mount_preview(&self) -> Result<(), StudioError> {
        let options = self.published();
        self.render_preview(&options).await
    }

    async fn render_preview(&self, options: &QrOptions) -> Result<(), StudioError> {
        let src = &options.image_settings.src;
        let href = if !options.image_settings.is_embedded() {
            None
        } else {
            match self.images.resolve(src).await {
                Ok(href) => href,
                Err(StudioError::UnsupportedImageSource(_)) => {
                    log::warn!("Embedded image source rejected: {}", src);
                    None
                }
                // удалённую ссылку оставляем как есть, клиент загрузит её сам
                Err(e) => {
                    log::warn!("Embedded image {} unavailable: {}", src, e);
                    Some(src.clone())
                }
            }
        };

        let svg = render_svg(options, href.as_deref())?;

        let mut slot = self.preview.write().await;
        let version = slot.as_ref().map_or(1, |p| p.version + 1);
        *slot = Some(VectorPreview {
            version,
            width: options.size,
            height: options.size,
            svg,
        });

        log::debug!("Preview v{} rendered at {}px", version, options.size);
        Ok(())
    }

    /// Первичный рендер и перерисовка после каждой публикации
    pub fn spawn_renderer(&self) -> JoinHandle<()> {
        let studio = self.clone();
        let mut updates = self.publisher.subscribe();

        tokio::spawn(async move {
            if let Err(e) = studio.mount_preview().await {
                log::error!("Initial preview render failed: {}", e);
            }

            while updates.changed().await.is_ok() {
                let options = updates.borrow_and_update().clone();
                if let Err(e) = studio.render_preview(&options).await {
                    log::error!("Preview render failed, keeping previous: {}", e);
                }
            }
        })
    }

    /// Снять ожидающую публикацию при остановке сервера
    pub fn shutdown(&self) {
        if self.publisher.cancel_pending() {
            log::info!("Dropped pending settings publish on shutdown");
        }
        log::info!("Studio stopped after {} publishes", self.publisher.published_count());
    }

    /// PNG текущего превью. None, пока превью не смонтировано.
    ///
    /// Параллельные экспорты не отменяют друг друга, побочный эффект
    /// последнего завершившегося побеждает.
    pub async fn export_png(&self) -> Option<Result<RasterImage, StudioError>> {
        let svg = self.preview.read().await.as_ref()?.svg.clone();

        let result = tokio::task::spawn_blocking(move || rasterize(&svg))
            .await
            .map_err(StudioError::from)
            .and_then(|r| r);
        Some(result)
    }

    pub async fn copy_to_clipboard(&self) -> Option<CopyReport> {
        let svg = self.preview.read().await.as_ref()?.svg.clone();
        let export_id = Uuid::new_v4().simple().to_string();
        log::info!("Export {} started (clipboard)", export_id);

        let clipboard = self.clipboard.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<(u32, u32), StudioError> {
            let raster = rasterize(&svg)?;
            clipboard.write_image(&raster, PNG_MIME)?;
            Ok((raster.width(), raster.height()))
        })
        .await
        .map_err(StudioError::from)
        .and_then(|r| r);

        let (success, notification) = match result {
            Ok((width, height)) => {
                log::info!("Export {} copied {}x{} PNG to clipboard", export_id, width, height);
                (true, self.notifier.push(NotificationLevel::Success, COPY_SUCCESS).await)
            }
            Err(e) => {
                log::error!("Export {} clipboard copy failed: {}", export_id, e);
                (false, self.notifier.push(NotificationLevel::Error, COPY_FAILURE).await)
            }
        };

        Some(CopyReport {
            export_id,
            success,
            notification,
        })
    }

    /// Для скачивания уведомлений нет, ошибка уходит только в ответ и лог
    pub async fn download(&self) -> Option<Result<Download, StudioError>> {
        let export_id = Uuid::new_v4().simple().to_string();

        let result = match self.export_png().await? {
            Ok(raster) => {
                log::info!(
                    "Export {} produced {} byte PNG for download",
                    export_id,
                    raster.png.len()
                );
                Ok(Download {
                    export_id,
                    filename: self.config.download_filename.clone(),
                    bytes: raster.png,
                })
            }
            Err(e) => {
                log::error!("Export {} download failed: {}", export_id, e);
                Err(e)
            }
        };
        Some(result)
    }
}
