//! Track form draft and client-side validation
//!
//! Validation runs before any request is built. A draft that fails
//! validation never reaches the API client.

use reqwest::Url;
use std::collections::BTreeMap;
use std::fmt;
use trackshelf_common::{Track, TrackFields};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const ARTIST_REQUIRED: &str = "Artist is required";
pub const GENRE_REQUIRED: &str = "At least one genre is required";
pub const COVER_INVALID: &str = "Cover image must be a valid URL";

/// Form field that can carry a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Artist,
    Genres,
    CoverImage,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Artist => "artist",
            Field::Genres => "genres",
            Field::CoverImage => "coverImage",
        }
    }
}

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field.name(), message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Editable contents of the create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackDraft {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover_image: String,
    /// Selected genre names in selection order
    pub genres: Vec<String>,
}

impl TrackDraft {
    /// Draft pre-filled from an existing track
    pub fn from_track(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone().unwrap_or_default(),
            cover_image: track.cover_image.clone().unwrap_or_default(),
            genres: track.genres.clone(),
        }
    }

    /// Select the genre if absent, deselect it if present
    pub fn toggle_genre(&mut self, name: &str) {
        if let Some(pos) = self.genres.iter().position(|g| g == name) {
            self.genres.remove(pos);
        } else {
            self.genres.push(name.to_string());
        }
    }

    /// Check the draft and build the request payload
    ///
    /// Text fields are trimmed; empty album and cover image become absent.
    pub fn validate(&self) -> Result<TrackFields, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        let artist = self.artist.trim();
        let album = self.album.trim();
        let cover_image = self.cover_image.trim();

        if title.is_empty() {
            errors.insert(Field::Title, TITLE_REQUIRED);
        }
        if artist.is_empty() {
            errors.insert(Field::Artist, ARTIST_REQUIRED);
        }
        if self.genres.is_empty() {
            errors.insert(Field::Genres, GENRE_REQUIRED);
        }
        if !cover_image.is_empty() && !is_web_url(cover_image) {
            errors.insert(Field::CoverImage, COVER_INVALID);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TrackFields {
            title: title.to_string(),
            artist: artist.to_string(),
            album: (!album.is_empty()).then(|| album.to_string()),
            genres: self.genres.clone(),
            cover_image: (!cover_image.is_empty()).then(|| cover_image.to_string()),
        })
    }
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}
