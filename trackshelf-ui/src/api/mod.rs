//! Backend API seam
//!
//! [`TrackApi`] is the one trait the controllers depend on. Each operation
//! is a single request/response round trip with no retry and no effect on
//! local state; callers own state updates.

use crate::error::ApiError;
use async_trait::async_trait;
use trackshelf_common::{Genre, PageResult, Track, TrackFields, TrackPatch, TrackQuery};

pub mod client;

pub use client::{audio_url, HttpTrackApi};

/// Media types accepted for audio uploads
pub const ALLOWED_AUDIO_TYPES: [&str; 3] = ["audio/mpeg", "audio/wav", "audio/mp3"];

/// Audio file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub file_name: String,
    /// Media type as reported by the file picker
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AudioFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Whether the media type is on the upload allow-list
    pub fn is_allowed_type(&self) -> bool {
        ALLOWED_AUDIO_TYPES.contains(&self.content_type.as_str())
    }
}

/// Tracks backend operations
#[async_trait]
pub trait TrackApi: Send + Sync {
    /// `GET /tracks` with page, limit and optional filters
    async fn list_tracks(&self, query: &TrackQuery) -> Result<PageResult, ApiError>;

    /// `GET /genres`
    async fn list_genres(&self) -> Result<Vec<Genre>, ApiError>;

    /// `POST /tracks`
    async fn create_track(&self, fields: &TrackFields) -> Result<Track, ApiError>;

    /// `PUT /tracks/{id}`
    async fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<Track, ApiError>;

    /// `DELETE /tracks/{id}`
    async fn delete_track(&self, id: &str) -> Result<(), ApiError>;

    /// `POST /tracks/{id}/upload` as multipart field `file`
    async fn upload_audio(&self, id: &str, file: AudioFile) -> Result<Track, ApiError>;
}
