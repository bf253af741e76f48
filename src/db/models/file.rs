//! Shared file models.

use bytes::Bytes;
use serde::Serialize;

use crate::db::OneShot;

#[derive(Debug, Clone, Serialize)]
pub struct SharedFile {
    pub uuid: String,
    pub author: String,
    pub filename: String,
    pub size: usize,
    pub uploaded_at: String,
    pub downloaded: OneShot,
    /// Uploaded bytes; never part of a JSON response.
    #[serde(skip)]
    pub content: Bytes,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uuid: String,
    pub download_link: String,
}
