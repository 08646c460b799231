//! Track, genre and query types shared between the API client and controllers
//!
//! Field names follow the backend's camelCase JSON. Server-owned fields
//! (`id`, `slug`, `createdAt`, `updatedAt`) only appear on [`Track`]; the
//! create and update payloads cannot carry them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Track record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Opaque server-assigned identifier
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Genre names in display order
    #[serde(default)]
    pub genres: Vec<String>,
    /// URL-friendly form of the title, assigned by the server
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Name of the uploaded audio file, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-editable track fields (create payload)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFields {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Partial update payload; only present fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Full edit payload
///
/// `album` is always sent, as an empty string when absent, so a cleared
/// album is cleared on the server. A missing cover image is left out.
impl From<TrackFields> for TrackPatch {
    fn from(fields: TrackFields) -> Self {
        Self {
            title: Some(fields.title),
            artist: Some(fields.artist),
            album: Some(fields.album.unwrap_or_default()),
            genres: Some(fields.genres),
            cover_image: fields.cover_image,
        }
    }
}

/// Genre reference entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
}

impl<'de> Deserialize<'de> for Genre {
    /// Accepts `{ "id": .., "name": .. }` or a bare genre name
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Object { id: String, name: String },
            Name(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Object { id, name } => Genre { id, name },
            Wire::Name(name) => Genre {
                id: name.clone(),
                name,
            },
        })
    }
}

/// Paginated list envelope returned by `GET /tracks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// One fetched page of tracks plus the total count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub items: Vec<Track>,
    pub total: u64,
}

impl PageResult {
    /// Build a page from the wire envelope, enforcing `items <= limit` and
    /// `items <= total`
    pub fn from_response(response: PaginatedResponse<Track>, limit: u32) -> Self {
        let mut items = response.data;
        let mut total = response.total;

        if items.len() > limit as usize {
            warn!(
                received = items.len(),
                limit, "Backend returned more tracks than requested, truncating"
            );
            items.truncate(limit as usize);
        }

        if (items.len() as u64) > total {
            warn!(
                received = items.len(),
                total, "Backend total smaller than page size, adjusting"
            );
            total = items.len() as u64;
        }

        Self { items, total }
    }

    /// Distinct artists in first-appearance order
    pub fn artists(&self) -> Vec<String> {
        let mut artists: Vec<String> = Vec::new();
        for track in &self.items {
            if !artists.iter().any(|a| a == &track.artist) {
                artists.push(track.artist.clone());
            }
        }
        artists
    }
}

/// Query for one page of tracks
///
/// Blank search and filter values are normalized to `None`, so two queries
/// that would produce the same request compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
}

impl TrackQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            search: None,
            genre: None,
            artist: None,
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = non_blank(search);
        self
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = non_blank(genre);
        self
    }

    pub fn with_artist(mut self, artist: Option<String>) -> Self {
        self.artist = non_blank(artist);
        self
    }

    /// Query-string pairs in request order; absent filters are omitted
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(genre) = &self.genre {
            pairs.push(("genre", genre.clone()));
        }
        if let Some(artist) = &self.artist {
            pairs.push(("artist", artist.clone()));
        }
        pairs
    }
}

/// Trim a value and drop it when nothing is left
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
