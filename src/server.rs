use crate::catalog::{CatalogClient, Category, Listing};
use crate::config::{Config, PAGE_SIZE};
use crate::enhance::{self, EnhancementParams, RasterImage};
use crate::error::ApiError;
use crate::fetch::ImageFetcher;
use crate::history::{HistoryEntry, HistoryStore, ProgressUpdate};
use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Default upscale factor for the enhance endpoint.
const DEFAULT_SCALE: f32 = 2.0;
/// Enhanced output is bounded to these dimensions by shrinking the
/// effective scale (tall manhwa strips hit the height cap first).
const MAX_TARGET_WIDTH: u32 = 4096;
const MAX_TARGET_HEIGHT: u32 = 6144;

/// History entries are tiny JSON bodies.
const MAX_BODY_BYTES: usize = 64 * 1024;

const SEARCH_CACHE: &str = "public, s-maxage=30, stale-while-revalidate=120";
const LISTING_CACHE: &str = "public, s-maxage=60, stale-while-revalidate=300";
const READ_CACHE: &str = "public, s-maxage=300, stale-while-revalidate=600";
const IMAGE_CACHE: &str = "public, max-age=604800, s-maxage=604800, stale-while-revalidate=86400";
const FALLBACK_IMAGE_CACHE: &str = "public, max-age=604800, s-maxage=604800";

fn x_enhanced() -> HeaderName {
    HeaderName::from_static("x-enhanced")
}

fn x_scale() -> HeaderName {
    HeaderName::from_static("x-scale")
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogClient>,
    pub fetcher: Arc<ImageFetcher>,
    pub history: Arc<HistoryStore>,
    pub config: Arc<Config>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub catalog_url: String,
    pub page_size: u32,
    pub max_scale: f32,
    pub default_params: DefaultParamsInfo,
    pub history_capacity: usize,
}

#[derive(Serialize)]
pub struct DefaultParamsInfo {
    pub sharpen_strength: f32,
    pub contrast: f32,
    pub denoise_radius: u32,
    pub denoise_threshold: u32,
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
    page: Option<u32>,
}

#[derive(Deserialize)]
struct CategoryQuery {
    category: Option<String>,
    page: Option<u32>,
}

#[derive(Deserialize)]
struct IdQuery {
    id: Option<String>,
}

#[derive(Deserialize)]
struct ImageQuery {
    url: Option<String>,
}

#[derive(Deserialize)]
struct EnhanceQuery {
    url: Option<String>,
    scale: Option<f32>,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState {
        catalog: Arc::new(CatalogClient::new(&config)?),
        fetcher: Arc::new(ImageFetcher::new(&config)?),
        history: Arc::new(HistoryStore::load(
            config.history_file.clone(),
            config.history_capacity,
        )),
        config: Arc::new(config),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .route("/api/manga/search", get(handle_search))
        .route("/api/manga/popular", get(handle_popular))
        .route("/api/manga/latest", get(handle_latest))
        .route("/api/manga/recent", get(handle_recent))
        .route("/api/manga/category", get(handle_category))
        .route("/api/manga/info", get(handle_manga_info))
        .route("/api/manga/read", get(handle_read))
        .route("/api/manga/image", get(handle_image))
        .route("/api/manga/enhance", get(handle_enhance))
        .route(
            "/api/history",
            get(handle_history_list).post(handle_history_upsert),
        )
        .route(
            "/api/history/:manga_id",
            patch(handle_history_progress).delete(handle_history_remove),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 1-based page parameter to catalog offset.
fn page_offset(page: Option<u32>) -> u32 {
    page.unwrap_or(1)
        .max(1)
        .saturating_sub(1)
        .saturating_mul(PAGE_SIZE)
}

async fn list_response(
    state: &AppState,
    listing: Listing,
    page: Option<u32>,
    cache: &'static str,
) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .catalog
        .list(&listing, PAGE_SIZE, page_offset(page))
        .await?;
    Ok(([(header::CACHE_CONTROL, cache)], Json(data)))
}

/// Handle title search; a missing or empty query yields an empty page
/// rather than an error.
async fn handle_search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let query = q.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Ok(Json(crate::catalog::MangaPage::empty()).into_response());
    }
    Ok(
        list_response(&state, Listing::Search { query }, q.page, SEARCH_CACHE)
            .await?
            .into_response(),
    )
}

async fn handle_popular(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_response(&state, Listing::Popular, q.page, LISTING_CACHE).await
}

async fn handle_latest(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_response(&state, Listing::Latest, q.page, LISTING_CACHE).await
}

async fn handle_recent(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_response(&state, Listing::Recent, q.page, LISTING_CACHE).await
}

async fn handle_category(
    State(state): State<AppState>,
    Query(q): Query<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = q
        .category
        .as_deref()
        .and_then(Category::from_str)
        .ok_or_else(|| ApiError::InvalidRequest("Invalid category".to_string()))?;
    list_response(&state, Listing::Category(category), q.page, LISTING_CACHE).await
}

async fn handle_manga_info(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = q.id.ok_or(ApiError::MissingParam("id"))?;
    let data = state.catalog.detail(&id).await?;
    Ok(([(header::CACHE_CONTROL, LISTING_CACHE)], Json(data)))
}

async fn handle_read(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = q.id.ok_or(ApiError::MissingParam("id"))?;
    let pages = state.catalog.chapter_pages(&id).await?;
    Ok(([(header::CACHE_CONTROL, READ_CACHE)], Json(pages)))
}

/// Proxy an upstream image unmodified, with long-lived cache headers.
async fn handle_image(
    State(state): State<AppState>,
    Query(q): Query<ImageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let url = q.url.ok_or(ApiError::MissingParam("url"))?;
    let fetched = state.fetcher.fetch(&url).await?;
    Ok((
        [
            (header::CONTENT_TYPE, fetched.content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE.to_string()),
        ],
        fetched.bytes,
    ))
}

/// Fetch an upstream image and run it through the enhancement pipeline.
/// Any decode or filter failure falls back to the original bytes, so
/// the reader never sees an error for a cosmetic feature.
async fn handle_enhance(
    State(state): State<AppState>,
    Query(q): Query<EnhanceQuery>,
) -> Result<Response, ApiError> {
    let url = q.url.ok_or(ApiError::MissingParam("url"))?;
    let requested = q.scale.unwrap_or(DEFAULT_SCALE);
    if !requested.is_finite() || requested <= 0.0 {
        return Err(ApiError::InvalidRequest(format!(
            "scale must be positive, got {}",
            requested
        )));
    }
    let scale = requested.min(state.config.max_scale).min(enhance::MAX_SCALE);

    let start = Instant::now();
    let fetched = state.fetcher.fetch(&url).await?;

    let bytes = fetched.bytes.clone();
    let enhanced = tokio::task::spawn_blocking(move || enhance_bytes(&bytes, scale))
        .await
        .map_err(|e| ApiError::Internal(format!("Enhancement task panicked: {}", e)))?;

    match enhanced {
        Ok(png) => {
            tracing::info!(
                "Enhanced image ({} -> {} bytes, scale {}) in {}ms",
                fetched.bytes.len(),
                png.len(),
                scale,
                start.elapsed().as_millis()
            );
            Ok((
                [
                    (header::CONTENT_TYPE, "image/png".to_string()),
                    (header::CACHE_CONTROL, IMAGE_CACHE.to_string()),
                    (x_enhanced(), "true".to_string()),
                    (x_scale(), scale.to_string()),
                ],
                png,
            )
                .into_response())
        }
        Err(e) => {
            tracing::warn!("Enhancement failed ({}), serving original image", e);
            Ok((
                [
                    (header::CONTENT_TYPE, fetched.content_type),
                    (header::CACHE_CONTROL, FALLBACK_IMAGE_CACHE.to_string()),
                    (x_enhanced(), "false".to_string()),
                ],
                fetched.bytes,
            )
                .into_response())
        }
    }
}

/// Decode, enhance, and re-encode as PNG. CPU-bound; run off the
/// async runtime.
fn enhance_bytes(bytes: &[u8], scale: f32) -> Result<Vec<u8>, ApiError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let raster = RasterImage::new(width, height, rgba.into_raw())?;
    let params = EnhancementParams {
        scale: effective_scale(width, height, scale),
        ..Default::default()
    };
    let result = enhance::Pipeline::new(params).process(&raster)?;
    for step in &result.steps {
        tracing::debug!("Enhancement stage {} took {}ms", step.name, step.time_ms);
    }
    tracing::debug!("Enhancement pipeline total: {}ms", result.total_time_ms);

    let result = result.image;
    let out = RgbaImage::from_raw(result.width, result.height, result.data)
        .ok_or_else(|| ApiError::Internal("Enhanced buffer has unexpected size".to_string()))?;
    let mut cursor = Cursor::new(Vec::new());
    out.write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| ApiError::Internal(format!("PNG encode failed: {}", e)))?;
    Ok(cursor.into_inner())
}

/// Shrink the scale as needed so the target stays within the output
/// dimension caps.
fn effective_scale(width: u32, height: u32, requested: f32) -> f32 {
    let fit_w = MAX_TARGET_WIDTH as f32 / width as f32;
    let fit_h = MAX_TARGET_HEIGHT as f32 / height as f32;
    requested.min(fit_w).min(fit_h)
}

async fn handle_history_list(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.list().await)
}

async fn handle_history_upsert(
    State(state): State<AppState>,
    Json(entry): Json<HistoryEntry>,
) -> StatusCode {
    state.history.upsert(entry).await;
    StatusCode::NO_CONTENT
}

async fn handle_history_progress(
    State(state): State<AppState>,
    Path(manga_id): Path<String>,
    Json(update): Json<ProgressUpdate>,
) -> Result<StatusCode, ApiError> {
    if state.history.update_progress(&manga_id, update).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "manga {} is not in the reading history",
            manga_id
        )))
    }
}

async fn handle_history_remove(
    State(state): State<AppState>,
    Path(manga_id): Path<String>,
) -> StatusCode {
    state.history.remove(&manga_id).await;
    StatusCode::NO_CONTENT
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    let defaults = EnhancementParams::default();
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_url: state.config.catalog_url.clone(),
        page_size: PAGE_SIZE,
        max_scale: state.config.max_scale,
        default_params: DefaultParamsInfo {
            sharpen_strength: defaults.sharpen_strength,
            contrast: defaults.contrast,
            denoise_radius: defaults.denoise_radius,
            denoise_threshold: defaults.denoise_threshold,
        },
        history_capacity: state.config.history_capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset_math() {
        assert_eq!(page_offset(None), 0);
        assert_eq!(page_offset(Some(0)), 0);
        assert_eq!(page_offset(Some(1)), 0);
        assert_eq!(page_offset(Some(2)), 20);
        assert_eq!(page_offset(Some(5)), 80);
        // Absurd page numbers saturate instead of overflowing
        assert_eq!(page_offset(Some(u32::MAX)), u32::MAX);
    }

    #[test]
    fn test_effective_scale_respects_caps() {
        // Small image: requested scale survives
        assert_eq!(effective_scale(800, 1200, 2.0), 2.0);
        // Wide image hits the width cap: 4096 / 3000
        let s = effective_scale(3000, 1000, 3.0);
        assert!((s - 4096.0 / 3000.0).abs() < 1e-6);
        // Tall strip hits the height cap: 6144 / 5000
        let s = effective_scale(800, 5000, 2.0);
        assert!((s - 6144.0 / 5000.0).abs() < 1e-6);
    }

    #[test]
    fn test_enhance_bytes_roundtrip() {
        // Encode a small red PNG, enhance at 2x, decode and check
        let src = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut cursor = Cursor::new(Vec::new());
        src.write_to(&mut cursor, image::ImageFormat::Png).unwrap();

        let png = enhance_bytes(&cursor.into_inner(), 2.0).unwrap();
        let out = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (4, 4));
        for px in out.pixels() {
            assert!(px.0[0] >= 253);
            assert!(px.0[1] <= 2);
            assert!(px.0[2] <= 2);
            assert!(px.0[3] >= 253);
        }
    }

    #[test]
    fn test_enhance_bytes_rejects_garbage() {
        assert!(matches!(
            enhance_bytes(b"definitely not an image", 2.0),
            Err(ApiError::Decode(_))
        ));
    }
}
