use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use filestorage_core::{FileStorage, StorageMetrics, StoredFile, validate_filename};
use serde::Serialize;
use tower_http::trace::TraceLayer;

mod error;
mod settings;
pub mod telemetry;

pub use error::ApiError;
pub use settings::{Settings, SettingsError};

pub const SERVICE_NAME: &str = "File Storage API";

/// Route signatures advertised by `GET /`.
pub const ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /files",
    "POST /files",
    "GET /files/{filename}",
    "GET /metrics",
];

/// Multipart field that carries the uploaded file.
const FILE_FIELD: &str = "file";

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    storage: FileStorage,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(storage: FileStorage) -> Self {
        Self {
            storage,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/files", get(list_files).post(upload_file))
        .route("/files/:filename", get(download_file))
        .route("/metrics", get(metrics))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RootInfo {
    message: &'static str,
    endpoints: &'static [&'static str],
}

async fn root() -> Json<RootInfo> {
    Json(RootInfo {
        message: SERVICE_NAME,
        endpoints: ENDPOINTS,
    })
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    service: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Serialize)]
struct FileList {
    files: Vec<String>,
    count: usize,
}

async fn list_files(State(state): State<AppState>) -> Result<Json<FileList>, ApiError> {
    let files = state.storage.list().await?;
    let count = files.len();
    Ok(Json(FileList { files, count }))
}

/// Reads the whole `file` part before touching disk, so a broken upload
/// leaves neither a partial file nor a counter bump behind.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StoredFile>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            return Err(ApiError::MissingFile);
        };
        validate_filename(&filename)?;

        let data = field.bytes().await?;
        let stored = state.storage.put(&filename, &data).await?;
        tracing::info!(filename = %stored.filename, size = stored.size, "upload complete");
        return Ok(Json(stored));
    }

    Err(ApiError::MissingFile)
}

async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.storage.get(&filename).await?;
    let len = bytes.len();

    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    Ok(response)
}

async fn metrics(State(state): State<AppState>) -> Result<Json<StorageMetrics>, ApiError> {
    Ok(Json(state.storage.metrics().await?))
}
