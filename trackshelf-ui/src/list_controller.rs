//! Track list controller
//!
//! Owns the current query, the current page of tracks and the genre
//! reference list. Fetching follows the state machine
//! `Idle -> Loading -> {Loaded, Failed}` and re-enters `Loading` whenever the
//! effective query changes.
//!
//! # Ordering
//!
//! Every fetch takes a sequence number. A response is applied only if no
//! newer fetch has been issued since; otherwise it is dropped, so a slow
//! response for an old filter can never overwrite a newer page.
//!
//! # Failures
//!
//! A failed fetch keeps the last good page visible and stores the error
//! message for display.

use crate::api::TrackApi;
use crate::error::ApiError;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trackshelf_common::pagination::{calculate_pagination, total_pages, Pagination};
use trackshelf_common::{Genre, PageResult, Track, TrackQuery};

/// Fetch state of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Result of a fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Response stored as the current page
    Applied,
    /// Request failed; previous page kept
    Failed(ApiError),
    /// A newer fetch was issued while this one was in flight
    Superseded,
    /// Query unchanged since the last fetch; nothing sent
    Unchanged,
    /// Controller closed; nothing sent or applied
    Closed,
}

/// Render snapshot of the list
#[derive(Debug, Clone)]
pub struct ListView {
    pub phase: LoadPhase,
    pub query: TrackQuery,
    pub items: Vec<Track>,
    pub total: u64,
    pub pagination: Pagination,
    /// Error banner text
    pub error: Option<String>,
    pub genres: Vec<Genre>,
    /// Distinct artists on the current page, for the artist filter
    pub artist_options: Vec<String>,
}

#[derive(Debug)]
struct ListState {
    query: TrackQuery,
    phase: LoadPhase,
    page: PageResult,
    error: Option<String>,
    genres: Option<Vec<Genre>>,
    genres_loading: bool,
    /// Sequence number of the most recently issued fetch
    latest_seq: u64,
    /// Query of the most recently issued fetch
    last_issued: Option<TrackQuery>,
}

pub struct ListController {
    api: Arc<dyn TrackApi>,
    state: RwLock<ListState>,
    closed: CancellationToken,
    /// Bumped whenever the view changes
    revision: watch::Sender<u64>,
}

impl ListController {
    pub fn new(api: Arc<dyn TrackApi>, limit: u32) -> Self {
        Self {
            api,
            state: RwLock::new(ListState {
                query: TrackQuery::new(1, limit),
                phase: LoadPhase::Idle,
                page: PageResult::default(),
                error: None,
                genres: None,
                genres_loading: false,
                latest_seq: 0,
                last_issued: None,
            }),
            closed: CancellationToken::new(),
            revision: watch::channel(0).0,
        }
    }

    /// Receiver notified whenever the rendered view may have changed
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    /// Fetch the current query if it differs from the last issued one
    pub async fn sync(&self) -> FetchOutcome {
        self.fetch(false).await
    }

    /// Fetch the current query unconditionally
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch(true).await
    }

    /// Fetch, then refetch once if the requested page lies past the last one
    async fn fetch(&self, force: bool) -> FetchOutcome {
        let outcome = self.fetch_once(force).await;
        if outcome == FetchOutcome::Applied && self.clamp_page().await {
            return self.fetch_once(false).await;
        }
        outcome
    }

    /// Pull the query page back to `max(1, total_pages)`; true if it moved
    async fn clamp_page(&self) -> bool {
        let mut state = self.state.write().await;
        let last = total_pages(state.page.total, state.query.limit).max(1);
        if state.query.page <= last {
            return false;
        }
        debug!(requested = state.query.page, last, "Requested page past the end, clamping");
        state.query.page = last;
        true
    }

    async fn fetch_once(&self, force: bool) -> FetchOutcome {
        let (seq, query) = {
            let mut state = self.state.write().await;
            if self.closed.is_cancelled() {
                return FetchOutcome::Closed;
            }
            if !force && state.last_issued.as_ref() == Some(&state.query) {
                return FetchOutcome::Unchanged;
            }

            state.latest_seq += 1;
            state.last_issued = Some(state.query.clone());
            state.phase = LoadPhase::Loading;
            (state.latest_seq, state.query.clone())
        };

        debug!(seq, ?query, "Fetching tracks");
        let result = self.api.list_tracks(&query).await;

        let mut state = self.state.write().await;
        if self.closed.is_cancelled() {
            debug!(seq, "Controller closed, dropping response");
            return FetchOutcome::Closed;
        }
        if seq != state.latest_seq {
            debug!(seq, latest = state.latest_seq, "Discarding stale track response");
            return FetchOutcome::Superseded;
        }

        let outcome = match result {
            Ok(page) => {
                state.page = page;
                state.phase = LoadPhase::Loaded;
                state.error = None;
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!(seq, error = %e, "Failed to load tracks");
                state.error = Some(e.user_message());
                state.phase = LoadPhase::Failed;
                FetchOutcome::Failed(e)
            }
        };
        drop(state);
        self.bump();
        outcome
    }

    /// Apply `update` to the query, then fetch if it changed
    async fn update_query(&self, update: impl FnOnce(&mut TrackQuery)) -> FetchOutcome {
        {
            let mut state = self.state.write().await;
            update(&mut state.query);
        }
        self.sync().await
    }

    /// Replace the whole query, then fetch if it changed
    pub async fn set_query(&self, query: TrackQuery) -> FetchOutcome {
        self.update_query(|q| *q = query).await
    }

    /// Go to `page`; a page past the end is pulled back to the last page
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        self.update_query(|q| q.page = page.max(1)).await
    }

    /// Advance one page; no-op when the current page is the last
    pub async fn next_page(&self) -> FetchOutcome {
        let (has_next, page) = {
            let state = self.state.read().await;
            let pagination = calculate_pagination(state.page.total, state.query.limit, state.query.page);
            (pagination.has_next, state.query.page)
        };
        if !has_next {
            return FetchOutcome::Unchanged;
        }
        self.set_page(page + 1).await
    }

    /// Go back one page; no-op on the first page
    pub async fn prev_page(&self) -> FetchOutcome {
        let page = self.state.read().await.query.page;
        if page <= 1 {
            return FetchOutcome::Unchanged;
        }
        self.set_page(page - 1).await
    }

    pub async fn set_limit(&self, limit: u32) -> FetchOutcome {
        self.update_query(|q| {
            let limit = limit.max(1);
            if q.limit != limit {
                q.limit = limit;
                q.page = 1;
            }
        })
        .await
    }

    /// Apply a debounced search term; blank clears the search
    pub async fn set_search(&self, term: Option<String>) -> FetchOutcome {
        self.update_query(|q| {
            let next = q.clone().with_search(term);
            if next.search != q.search {
                q.search = next.search;
                q.page = 1;
            }
        })
        .await
    }

    pub async fn set_genre(&self, genre: Option<String>) -> FetchOutcome {
        self.update_query(|q| {
            let next = q.clone().with_genre(genre);
            if next.genre != q.genre {
                q.genre = next.genre;
                q.page = 1;
            }
        })
        .await
    }

    pub async fn set_artist(&self, artist: Option<String>) -> FetchOutcome {
        self.update_query(|q| {
            let next = q.clone().with_artist(artist);
            if next.artist != q.artist {
                q.artist = next.artist;
                q.page = 1;
            }
        })
        .await
    }

    /// Load the genre reference list once per session
    ///
    /// A call made while another load is in flight returns without a request.
    pub async fn load_genres(&self) -> Result<(), ApiError> {
        {
            let mut state = self.state.write().await;
            if state.genres.is_some() || state.genres_loading || self.closed.is_cancelled() {
                return Ok(());
            }
            state.genres_loading = true;
        }

        let result = self.api.list_genres().await;

        let mut state = self.state.write().await;
        state.genres_loading = false;
        if self.closed.is_cancelled() {
            return Ok(());
        }
        let outcome = match result {
            Ok(genres) => {
                info!(count = genres.len(), "Loaded genres");
                state.genres = Some(genres);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load genres");
                state.error = Some(e.user_message());
                Err(e)
            }
        };
        drop(state);
        self.bump();
        outcome
    }

    /// Prepend a newly created track
    ///
    /// The last item is dropped if the page would exceed the limit.
    pub async fn apply_created(&self, track: Track) -> bool {
        let mut state = self.state.write().await;
        if self.closed.is_cancelled() {
            return false;
        }
        let limit = state.query.limit as usize;
        state.page.items.insert(0, track);
        state.page.items.truncate(limit);
        state.page.total += 1;
        drop(state);
        self.bump();
        true
    }

    /// Replace a track in place by id; unknown ids are ignored
    pub async fn apply_updated(&self, track: Track) -> bool {
        let mut state = self.state.write().await;
        if self.closed.is_cancelled() {
            return false;
        }
        match state.page.items.iter_mut().find(|t| t.id == track.id) {
            Some(slot) => {
                *slot = track;
                drop(state);
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Remove a track by id
    pub async fn apply_deleted(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        if self.closed.is_cancelled() {
            return false;
        }
        let before = state.page.items.len();
        state.page.items.retain(|t| t.id != id);
        if state.page.items.len() == before {
            return false;
        }
        state.page.total = state.page.total.saturating_sub(1);
        drop(state);
        self.bump();
        true
    }

    /// Track on the current page by id
    pub async fn find(&self, id: &str) -> Option<Track> {
        self.state
            .read()
            .await
            .page
            .items
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub async fn view(&self) -> ListView {
        let state = self.state.read().await;
        ListView {
            phase: state.phase,
            query: state.query.clone(),
            items: state.page.items.clone(),
            total: state.page.total,
            pagination: calculate_pagination(state.page.total, state.query.limit, state.query.page),
            error: state.error.clone(),
            genres: state.genres.clone().unwrap_or_default(),
            artist_options: state.page.artists(),
        }
    }

    /// Forward debounced search terms into the controller
    ///
    /// Each settled term is fetched on its own task so a slow response does
    /// not hold back newer terms. Stops when the sender is dropped or the
    /// controller is closed.
    pub fn spawn_search_feed(self: &Arc<Self>, mut terms: watch::Receiver<String>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = controller.closed.cancelled() => break,
                    changed = terms.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let term = terms.borrow_and_update().clone();
                        let fetcher = Arc::clone(&controller);
                        tokio::spawn(async move {
                            fetcher.set_search(Some(term)).await;
                        });
                    }
                }
            }
            debug!("Search feed stopped");
        })
    }

    /// Tear down: no further fetches, late responses are dropped
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}
