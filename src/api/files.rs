//! File sharing with download-once links.
//!
//! The download link is the capability: it needs no token and works exactly
//! once. Metadata routes are scoped to the uploader.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::auth::{auth_routes, AuthContext, AuthState, CurrentUser};
use super::error::ApiError;
use super::extract::{Json, Path};
use crate::auth::Policy;
use crate::config::Config;
use crate::db::{
    MemoryStore, MessageResponse, NoProfile, OneShot, Role, SharedFile, SharedStore,
    UploadResponse,
};

/// Room for the multipart framing around the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub struct FilesState {
    pub auth: AuthContext<NoProfile>,
    pub files: SharedStore<String, SharedFile>,
    pub max_upload_bytes: usize,
}

impl FilesState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
            files: MemoryStore::shared(),
            max_upload_bytes: config.files.max_upload_bytes,
        })
    }
}

impl AuthState for FilesState {
    type Profile = NoProfile;
    const ROLES: &'static [Role] = &[Role::User];

    fn auth(&self) -> &AuthContext<NoProfile> {
        &self.auth
    }
}

fn not_found() -> ApiError {
    ApiError::not_found("File not found")
}

fn too_large(max: usize) -> ApiError {
    ApiError::validation_field("file", format!("File is larger than {} bytes", max))
}

/// `attachment; filename="..."` with characters that would break the header dropped
fn content_disposition(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"' && *c != '\\')
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn upload_file(
    State(state): State<Arc<FilesState>>,
    user: CurrentUser<NoProfile>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let max = state.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content = field.bytes().await.map_err(|e| {
            if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
                too_large(max)
            } else {
                ApiError::bad_request(format!("Failed to read upload: {}", e))
            }
        })?;
        if content.len() > max {
            return Err(too_large(max));
        }

        let file = state.files.insert_next(&mut |uuid| SharedFile {
            uuid: uuid.clone(),
            author: user.username().to_string(),
            filename: filename.clone(),
            size: content.len(),
            uploaded_at: chrono::Utc::now().to_rfc3339(),
            downloaded: OneShot::default(),
            content: content.clone(),
        });

        tracing::info!(uuid = %file.uuid, author = %file.author, size = file.size, "File uploaded");
        return Ok(Json(UploadResponse {
            download_link: format!("/files/download/{}", file.uuid),
            uuid: file.uuid,
        }));
    }

    Err(ApiError::validation_field("file", "File is required"))
}

async fn my_files(
    State(state): State<Arc<FilesState>>,
    user: CurrentUser<NoProfile>,
) -> Json<Vec<SharedFile>> {
    Json(state.files.scan(&|_, f| f.author == user.username()))
}

/// Hand out the bytes once; later attempts get 410.
async fn download_file(
    State(state): State<Arc<FilesState>>,
    Path(uuid): Path<String>,
) -> Result<Response, ApiError> {
    let file = state
        .files
        .update(&uuid, |file| file.downloaded.claim().map(|()| file.clone()))
        .ok_or_else(not_found)?
        .map_err(|_| {
            tracing::info!(uuid = %uuid, "Repeated download refused");
            ApiError::gone("File was already downloaded")
        })?;

    tracing::info!(uuid = %uuid, "File downloaded");
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, content_disposition(&file.filename)),
        ],
        file.content,
    )
        .into_response())
}

fn owned_file(
    state: &FilesState,
    user: &CurrentUser<NoProfile>,
    uuid: &String,
) -> Result<SharedFile, ApiError> {
    let file = state.files.get(uuid).ok_or_else(not_found)?;
    Policy::Owner
        .check(&user.actor(), Some(file.author.as_str()))
        .map_err(|e| {
            tracing::warn!(uuid = %uuid, username = %user.username(), "Access to foreign file refused");
            ApiError::from(e)
        })?;
    Ok(file)
}

async fn get_file(
    State(state): State<Arc<FilesState>>,
    user: CurrentUser<NoProfile>,
    Path(uuid): Path<String>,
) -> Result<Json<SharedFile>, ApiError> {
    owned_file(&state, &user, &uuid).map(Json)
}

async fn delete_file(
    State(state): State<Arc<FilesState>>,
    user: CurrentUser<NoProfile>,
    Path(uuid): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_file(&state, &user, &uuid)?;
    state.files.remove(&uuid).ok_or_else(not_found)?;

    tracing::info!(uuid = %uuid, "File deleted");
    Ok(Json(MessageResponse::new("File deleted")))
}

pub fn router(state: Arc<FilesState>) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .merge(auth_routes::<FilesState>())
        .route("/files/upload", post(upload_file))
        .route("/files/me", get(my_files))
        .route("/files/download/:uuid", get(download_file).put(download_file))
        .route("/files/:uuid", get(get_file).delete(delete_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
