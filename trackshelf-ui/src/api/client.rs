//! HTTP implementation of [`TrackApi`] over reqwest

use super::{AudioFile, TrackApi};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use trackshelf_common::config::ClientConfig;
use trackshelf_common::{
    Genre, PageResult, PaginatedResponse, Track, TrackFields, TrackPatch, TrackQuery,
};

const USER_AGENT: &str = concat!("trackshelf/", env!("CARGO_PKG_VERSION"));

/// Error body sent by the backend on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Tracks backend client
#[derive(Debug, Clone)]
pub struct HttpTrackApi {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpTrackApi {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Playback URL for a track, if it has audio
    pub fn audio_url(&self, track: &Track) -> Option<Url> {
        audio_url(&self.base_url, track)
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = join_segments(&self.base_url, segments);
        tracing::debug!(method = %method, url = %url, "Sending API request");
        self.http_client.request(method, url)
    }

    /// Send and decode a JSON response body
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Send and map non-success statuses to errors
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "API request failed to complete");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let error = error_from_status(status, &body);
        tracing::warn!(status = status.as_u16(), url = %url, error = %error, "API request rejected");
        Err(error)
    }
}

#[async_trait]
impl TrackApi for HttpTrackApi {
    async fn list_tracks(&self, query: &TrackQuery) -> Result<PageResult, ApiError> {
        let request = self
            .request(Method::GET, &["tracks"])
            .query(&query.to_pairs());
        let response: PaginatedResponse<Track> = self.send_json(request).await?;

        let page = PageResult::from_response(response, query.limit);
        tracing::debug!(
            page = query.page,
            items = page.items.len(),
            total = page.total,
            "Fetched track page"
        );
        Ok(page)
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, ApiError> {
        self.send_json(self.request(Method::GET, &["genres"])).await
    }

    async fn create_track(&self, fields: &TrackFields) -> Result<Track, ApiError> {
        let request = self.request(Method::POST, &["tracks"]).json(fields);
        let track: Track = self.send_json(request).await?;
        tracing::info!(id = %track.id, title = %track.title, "Created track");
        Ok(track)
    }

    async fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<Track, ApiError> {
        let request = self.request(Method::PUT, &["tracks", id]).json(patch);
        let track: Track = self.send_json(request).await?;
        tracing::info!(id = %track.id, "Updated track");
        Ok(track)
    }

    async fn delete_track(&self, id: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &["tracks", id]))
            .await?;
        tracing::info!(id = %id, "Deleted track");
        Ok(())
    }

    async fn upload_audio(&self, id: &str, file: AudioFile) -> Result<Track, ApiError> {
        let size = file.bytes.len();
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::Validation(format!("Invalid media type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        let request = self
            .request(Method::POST, &["tracks", id, "upload"])
            .multipart(form);
        let track: Track = self.send_json(request).await?;
        tracing::info!(id = %id, bytes = size, "Uploaded audio");
        Ok(track)
    }
}

/// Playback URL `{base}/tracks/{id}/audio`
///
/// Resolved by track id; the stored `audioFile` name only signals that audio
/// exists and is never placed in the path.
pub fn audio_url(base_url: &Url, track: &Track) -> Option<Url> {
    track.audio_file.as_ref()?;
    Some(join_segments(base_url, &["tracks", &track.id, "audio"]))
}

fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let url = Url::parse(base_url.trim())
        .map_err(|e| ApiError::InvalidBaseUrl(format!("'{}': {}", base_url, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidBaseUrl(format!(
            "'{}' is not http or https",
            base_url
        )));
    }
    Ok(url)
}

/// Append percent-encoded path segments to the base URL
fn join_segments(base_url: &Url, segments: &[&str]) -> Url {
    let mut url = base_url.clone();
    // http(s) URLs always have a path; checked in parse_base_url
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Map a non-success response to an [`ApiError`]
///
/// The backend's `error` (or `message`) string is surfaced verbatim; without
/// one a generic message naming the status is used.
pub(crate) fn error_from_status(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        other => ApiError::Request(other.as_u16(), message),
    }
}
