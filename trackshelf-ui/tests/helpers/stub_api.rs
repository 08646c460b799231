//! In-memory [`TrackApi`] doubles

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use trackshelf_common::{Genre, PageResult, Track, TrackFields, TrackPatch, TrackQuery};
use trackshelf_ui::{ApiError, AudioFile, TrackApi};

/// Build a track with server-owned fields filled in
pub fn track(id: &str, title: &str, artist: &str) -> Track {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    Track {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        album: None,
        genres: vec!["rock".to_string()],
        slug: title.to_lowercase().replace(' ', "-"),
        cover_image: None,
        audio_file: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn page(items: Vec<Track>, total: u64) -> PageResult {
    PageResult { items, total }
}

/// Request recorded by [`StubApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    List(TrackQuery),
    Genres,
    Create(TrackFields),
    Update(String, TrackPatch),
    Delete(String),
    /// Track id and media type
    Upload(String, String),
}

fn unexpected<T>() -> Result<T, ApiError> {
    Err(ApiError::Request(500, "unexpected call".to_string()))
}

/// Canned responses per operation, consumed in order
///
/// With no queued response, list calls return an empty page and genre calls
/// an empty list; other calls fail.
#[derive(Default)]
pub struct StubApi {
    lists: Mutex<VecDeque<Result<PageResult, ApiError>>>,
    genres: Mutex<VecDeque<Result<Vec<Genre>, ApiError>>>,
    creates: Mutex<VecDeque<Result<Track, ApiError>>>,
    updates: Mutex<VecDeque<Result<Track, ApiError>>>,
    deletes: Mutex<VecDeque<Result<(), ApiError>>>,
    uploads: Mutex<VecDeque<Result<Track, ApiError>>>,
    requests: Mutex<Vec<Request>>,
}

impl StubApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_list(&self, response: Result<PageResult, ApiError>) {
        self.lists.lock().unwrap().push_back(response);
    }

    pub fn push_genres(&self, response: Result<Vec<Genre>, ApiError>) {
        self.genres.lock().unwrap().push_back(response);
    }

    pub fn push_create(&self, response: Result<Track, ApiError>) {
        self.creates.lock().unwrap().push_back(response);
    }

    pub fn push_update(&self, response: Result<Track, ApiError>) {
        self.updates.lock().unwrap().push_back(response);
    }

    pub fn push_delete(&self, response: Result<(), ApiError>) {
        self.deletes.lock().unwrap().push_back(response);
    }

    pub fn push_upload(&self, response: Result<Track, ApiError>) {
        self.uploads.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn list_requests(&self) -> Vec<TrackQuery> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::List(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    fn record(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl TrackApi for StubApi {
    async fn list_tracks(&self, query: &TrackQuery) -> Result<PageResult, ApiError> {
        self.record(Request::List(query.clone()));
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PageResult::default()))
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, ApiError> {
        self.record(Request::Genres);
        self.genres.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_track(&self, fields: &TrackFields) -> Result<Track, ApiError> {
        self.record(Request::Create(fields.clone()));
        self.creates.lock().unwrap().pop_front().unwrap_or_else(unexpected)
    }

    async fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<Track, ApiError> {
        self.record(Request::Update(id.to_string(), patch.clone()));
        self.updates.lock().unwrap().pop_front().unwrap_or_else(unexpected)
    }

    async fn delete_track(&self, id: &str) -> Result<(), ApiError> {
        self.record(Request::Delete(id.to_string()));
        self.deletes.lock().unwrap().pop_front().unwrap_or_else(unexpected)
    }

    async fn upload_audio(&self, id: &str, file: AudioFile) -> Result<Track, ApiError> {
        self.record(Request::Upload(id.to_string(), file.content_type));
        self.uploads.lock().unwrap().pop_front().unwrap_or_else(unexpected)
    }
}

/// Call waiting for the test to supply its response
#[derive(Debug)]
pub enum Pending {
    List(TrackQuery, oneshot::Sender<Result<PageResult, ApiError>>),
    Genres(oneshot::Sender<Result<Vec<Genre>, ApiError>>),
    Create(TrackFields, oneshot::Sender<Result<Track, ApiError>>),
    Upload(String, oneshot::Sender<Result<Track, ApiError>>),
}

/// Api whose list/genre/create/upload calls block until the test answers them
///
/// Lets a test complete requests in a different order than they were issued.
pub struct GatedApi {
    calls: mpsc::UnboundedSender<Pending>,
}

impl GatedApi {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Pending>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls }), rx)
    }

    async fn wait<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, ApiError>>) -> Pending,
    ) -> Result<T, ApiError> {
        let (tx, rx) = oneshot::channel();
        if self.calls.send(make(tx)).is_err() {
            return Err(ApiError::Network("test receiver gone".to_string()));
        }
        rx.await
            .unwrap_or_else(|_| Err(ApiError::Network("response dropped".to_string())))
    }
}

#[async_trait]
impl TrackApi for GatedApi {
    async fn list_tracks(&self, query: &TrackQuery) -> Result<PageResult, ApiError> {
        let query = query.clone();
        self.wait(|tx| Pending::List(query, tx)).await
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, ApiError> {
        self.wait(Pending::Genres).await
    }

    async fn create_track(&self, fields: &TrackFields) -> Result<Track, ApiError> {
        let fields = fields.clone();
        self.wait(|tx| Pending::Create(fields, tx)).await
    }

    async fn update_track(&self, _id: &str, _patch: &TrackPatch) -> Result<Track, ApiError> {
        unexpected()
    }

    async fn delete_track(&self, _id: &str) -> Result<(), ApiError> {
        unexpected()
    }

    async fn upload_audio(&self, id: &str, _file: AudioFile) -> Result<Track, ApiError> {
        let id = id.to_string();
        self.wait(|tx| Pending::Upload(id, tx)).await
    }
}
