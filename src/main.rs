use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result, middleware::Logger};
use serde::Serialize;
use std::sync::Arc;

mod clipboard;
mod color;
mod config;
mod error;
mod export;
mod image_source;
mod normalize;
mod notify;
mod publisher;
mod render;
mod settings;
mod studio;
mod validate;

use config::Config;
use error::ValidationError;
use settings::{ErrorCorrectionLevel, FieldChanges, SizePreset};
use studio::StudioService;

#[derive(Serialize)]
struct ServerInfo {
    message: String,
    status: String,
    version: String,
    error_correction_levels: Vec<LevelInfo>,
    size_presets: Vec<PresetInfo>,
}

#[derive(Serialize)]
struct LevelInfo {
    level: ErrorCorrectionLevel,
    recovery_percent: u8,
}

#[derive(Serialize)]
struct PresetInfo {
    preset: SizePreset,
    pixels: u32,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationError>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None, errors: Vec::new() }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()), errors: Vec::new() }
    }
}

#[derive(Serialize)]
struct PreviewResponse {
    version: u64,
    width: u32,
    height: u32,
    data_uri: String,
}

// Главная страница API
async fn index() -> Result<HttpResponse> {
    let info = ServerInfo {
        message: "QR Studio API Server 🦀".to_string(),
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        error_correction_levels: [
            ErrorCorrectionLevel::L,
            ErrorCorrectionLevel::M,
            ErrorCorrectionLevel::Q,
            ErrorCorrectionLevel::H,
        ]
        .into_iter()
        .map(|level| LevelInfo { level, recovery_percent: level.recovery_percent() })
        .collect(),
        size_presets: SizePreset::ALL
            .into_iter()
            .map(|preset| PresetInfo { preset, pixels: preset.pixels() })
            .collect(),
    };
    Ok(HttpResponse::Ok().json(info))
}

async fn get_form(studio: web::Data<StudioService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(studio.form_view().await)))
}

// Изменения формы от одного действия пользователя
async fn patch_form(
    studio: web::Data<StudioService>,
    req: web::Json<FieldChanges>,
) -> Result<HttpResponse> {
    let delta = req.into_inner();
    log::debug!("Form changes: {:?}", delta);

    match studio.apply_changes(delta).await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::ok(view))),
        Err(errors) => {
            let mut response = ApiResponse::<()>::failed("Validation failed");
            response.errors = errors;
            Ok(HttpResponse::BadRequest().json(response))
        }
    }
}

async fn get_settings(studio: web::Data<StudioService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(studio.published())))
}

async fn get_preview(studio: web::Data<StudioService>) -> Result<HttpResponse> {
    match studio.preview().await {
        Some(preview) => Ok(HttpResponse::Ok().json(ApiResponse::ok(PreviewResponse {
            version: preview.version,
            width: preview.width,
            height: preview.height,
            data_uri: export::svg_data_uri(&preview.svg),
        }))),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

async fn get_preview_svg(studio: web::Data<StudioService>) -> Result<HttpResponse> {
    match studio.preview().await {
        Some(preview) => Ok(HttpResponse::Ok()
            .content_type("image/svg+xml")
            .append_header(("Cache-Control", "no-store"))
            .body(preview.svg)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

async fn copy_qr_code(studio: web::Data<StudioService>) -> Result<HttpResponse> {
    match studio.copy_to_clipboard().await {
        Some(report) if report.success => Ok(HttpResponse::Ok().json(ApiResponse::ok(report))),
        Some(report) => {
            let mut response = ApiResponse::failed(report.notification.message.clone());
            response.data = Some(report);
            Ok(HttpResponse::InternalServerError().json(response))
        }
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

async fn download_qr_code(studio: web::Data<StudioService>) -> Result<HttpResponse> {
    match studio.download().await {
        Some(Ok(download)) => Ok(HttpResponse::Ok()
            .content_type(clipboard::PNG_MIME)
            .append_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", download.filename),
            ))
            .append_header(("X-Export-Id", download.export_id))
            .body(download.bytes)),
        Some(Err(e)) => Ok(HttpResponse::InternalServerError()
            .json(serde_json::json!({"success": false, "error": e.to_string()}))),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

async fn get_notifications(studio: web::Data<StudioService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(studio.notifications().await)))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index)).service(
        web::scope("/api")
            .route("/form", web::get().to(get_form))
            .route("/form", web::patch().to(patch_form))
            .route("/settings", web::get().to(get_settings))
            .route("/preview", web::get().to(get_preview))
            .route("/preview.svg", web::get().to(get_preview_svg))
            .route("/export/copy", web::post().to(copy_qr_code))
            .route("/export/download", web::get().to(download_qr_code))
            .route("/notifications", web::get().to(get_notifications)),
    );
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    println!("🦀 Starting QR Studio Server...");

    let config = Config::load()?;
    let clipboard: Arc<dyn clipboard::ClipboardSink> =
        Arc::from(clipboard::from_backend(config.studio.clipboard));
    let studio = StudioService::new(config.studio.clone(), clipboard);
    let renderer = studio.spawn_renderer();
    let shutdown = studio.clone();

    let host = config.server.host.clone();
    let port = config.server.port;

    println!("🚀 Server starting on http://{}:{}", host, port);
    println!("⏱  Quiet interval: {} ms", config.studio.quiet_interval_ms);
    println!("📋 Clipboard: {:?}", config.studio.clipboard);

    HttpServer::new(move || {
        let cors = Cors::default().allow_any_origin().allow_any_method().allow_any_header().max_age(3600);
        App::new()
            .app_data(web::Data::new(studio.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes)
    })
        .bind(format!("{}:{}", host, port))?
        .run()
        .await?;

    renderer.abort();
    shutdown.shutdown();
    Ok(())
}
