//! In-process tracks backend for HTTP client tests
//!
//! Serves the `/api` REST contract from an in-memory store on an ephemeral
//! localhost port.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use trackshelf_common::{Track, TrackFields, TrackPatch};

use super::stub_api::track;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

/// Upload as received by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedUpload {
    pub id: String,
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct Store {
    pub tracks: Vec<Track>,
    pub next_id: u32,
    /// Return every matching track regardless of `limit`
    pub ignore_limit: bool,
    pub uploads: Vec<ReceivedUpload>,
}

#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Store>>,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
    genre: Option<String>,
    artist: Option<String>,
}

pub struct FakeBackend {
    pub base_url: String,
    pub store: Arc<Mutex<Store>>,
}

impl FakeBackend {
    /// Start a backend seeded with `tracks`
    pub async fn start(tracks: Vec<Track>) -> Self {
        let next_id = tracks.len() as u32 + 1;
        let store = Arc::new(Mutex::new(Store {
            tracks,
            next_id,
            ..Default::default()
        }));
        let state = AppState {
            store: Arc::clone(&store),
        };

        let app = Router::new()
            .route("/api/tracks", get(list_tracks).post(create_track))
            .route("/api/tracks/:id", put(update_track).delete(delete_track))
            .route("/api/tracks/:id/upload", post(upload_audio))
            .route("/api/genres", get(list_genres))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind ephemeral port");
        let addr = listener.local_addr().expect("Should have local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake backend failed");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            store,
        }
    }

    /// Seed `count` tracks "Song 1".. by "Artist"
    pub async fn with_songs(count: u32) -> Self {
        let tracks = (1..=count)
            .map(|n| track(&format!("t{}", n), &format!("Song {}", n), "Artist"))
            .collect();
        Self::start(tracks).await
    }

    pub fn set_ignore_limit(&self, ignore: bool) {
        self.store.lock().unwrap().ignore_limit = ignore;
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.store.lock().unwrap().uploads.clone()
    }

    pub fn track_ids(&self) -> Vec<String> {
        self.store
            .lock()
            .unwrap()
            .tracks
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }
}

fn matches(track: &Track, params: &ListParams) -> bool {
    if let Some(search) = &params.search {
        let needle = search.to_lowercase();
        let hit = track.title.to_lowercase().contains(&needle)
            || track.artist.to_lowercase().contains(&needle)
            || track
                .album
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if let Some(genre) = &params.genre {
        if !track.genres.iter().any(|g| g == genre) {
            return false;
        }
    }
    if let Some(artist) = &params.artist {
        if &track.artist != artist {
            return false;
        }
    }
    true
}

async fn list_tracks(State(state): State<AppState>, Query(params): Query<ListParams>) -> Json<Value> {
    let store = state.store.lock().unwrap();
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).max(1);

    let matching: Vec<&Track> = store.tracks.iter().filter(|t| matches(t, &params)).collect();
    let total = matching.len();
    let data: Vec<&Track> = if store.ignore_limit {
        matching
    } else {
        matching
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect()
    };

    Json(json!({ "data": data, "total": total, "page": page, "limit": limit }))
}

async fn list_genres() -> Json<Value> {
    Json(json!(["Rock", "Jazz", "Pop"]))
}

async fn create_track(
    State(state): State<AppState>,
    Json(fields): Json<TrackFields>,
) -> ApiResult<(StatusCode, Json<Track>)> {
    if fields.title.trim().is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Title is required"));
    }

    let mut store = state.store.lock().unwrap();
    let id = format!("t{}", store.next_id);
    store.next_id += 1;

    let now = Utc::now();
    let created = Track {
        id,
        slug: fields.title.to_lowercase().replace(' ', "-"),
        title: fields.title,
        artist: fields.artist,
        album: fields.album,
        genres: fields.genres,
        cover_image: fields.cover_image,
        audio_file: None,
        created_at: now,
        updated_at: now,
    };
    store.tracks.insert(0, created.clone());
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TrackPatch>,
) -> ApiResult<Json<Track>> {
    let mut store = state.store.lock().unwrap();
    let track = store
        .tracks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Track not found"))?;

    if let Some(title) = patch.title {
        track.slug = title.to_lowercase().replace(' ', "-");
        track.title = title;
    }
    if let Some(artist) = patch.artist {
        track.artist = artist;
    }
    if let Some(album) = patch.album {
        track.album = Some(album).filter(|a| !a.is_empty());
    }
    if let Some(genres) = patch.genres {
        track.genres = genres;
    }
    if let Some(cover) = patch.cover_image {
        track.cover_image = Some(cover);
    }
    track.updated_at = Utc::now();
    Ok(Json(track.clone()))
}

async fn delete_track(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let mut store = state.store.lock().unwrap();
    let before = store.tracks.len();
    store.tracks.retain(|t| t.id != id);
    if store.tracks.len() == before {
        return Err(reject(StatusCode::NOT_FOUND, "Track not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<Track>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Malformed upload"))?
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "No file uploaded"))?;

    let received = ReceivedUpload {
        id: id.clone(),
        field: field.name().unwrap_or_default().to_string(),
        file_name: field.file_name().unwrap_or_default().to_string(),
        content_type: field.content_type().unwrap_or_default().to_string(),
        size: 0,
    };
    let bytes = field
        .bytes()
        .await
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Malformed upload"))?;

    if !received.content_type.starts_with("audio/") {
        return Err(reject(StatusCode::BAD_REQUEST, "Invalid file type"));
    }

    let mut store = state.store.lock().unwrap();
    store.uploads.push(ReceivedUpload {
        size: bytes.len(),
        ..received.clone()
    });

    let track = store
        .tracks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Track not found"))?;
    track.audio_file = Some(received.file_name);
    track.updated_at = Utc::now();
    Ok(Json(track.clone()))
}
