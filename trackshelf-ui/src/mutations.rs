//! Mutation coordinator: create, edit, delete and upload
//!
//! Successful responses are patched into the [`ListController`] directly
//! (prepend on create, replace on update, remove on delete). Uploads trigger
//! a full list refresh instead, since the server may change derived fields.
//!
//! A form submission or upload that is still in flight blocks a second one
//! for the same form or track.

use crate::api::{AudioFile, TrackApi};
use crate::error::MutationError;
use crate::forms::{FieldErrors, TrackDraft};
use crate::list_controller::ListController;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trackshelf_common::{Track, TrackPatch};

pub const DELETE_CONFIRM_MESSAGE: &str = "Are you sure you want to delete this track?";
pub const UPLOAD_TYPE_MESSAGE: &str = "Please upload MP3 or WAV file";

/// What a form submission will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

/// Open create/edit form
#[derive(Debug, Clone)]
pub struct FormState {
    pub mode: FormMode,
    pub draft: TrackDraft,
    pub field_errors: FieldErrors,
    /// Error from the last failed submission
    pub submit_error: Option<String>,
    /// Submission in flight; the submit control is disabled
    pub submitting: bool,
    session: u64,
}

/// Confirmation step shown before a delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub id: String,
    pub message: &'static str,
}

/// Per-track upload state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Failed(String),
}

#[derive(Debug, Default)]
struct CoordinatorState {
    form: Option<FormState>,
    next_session: u64,
    pending_delete: Option<String>,
    uploads: HashMap<String, UploadStatus>,
    banner: Option<String>,
}

pub struct MutationCoordinator {
    api: Arc<dyn TrackApi>,
    list: Arc<ListController>,
    state: Mutex<CoordinatorState>,
}

impl MutationCoordinator {
    pub fn new(api: Arc<dyn TrackApi>, list: Arc<ListController>) -> Self {
        Self {
            api,
            list,
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    async fn open_form(&self, mode: FormMode, draft: TrackDraft) {
        let mut state = self.state.lock().await;
        state.next_session += 1;
        let session = state.next_session;
        state.form = Some(FormState {
            mode,
            draft,
            field_errors: FieldErrors::default(),
            submit_error: None,
            submitting: false,
            session,
        });
    }

    /// Open an empty creation form
    pub async fn open_create(&self) {
        self.open_form(FormMode::Create, TrackDraft::default()).await;
    }

    /// Open an edit form pre-filled from `track`
    pub async fn open_edit(&self, track: &Track) {
        self.open_form(
            FormMode::Edit {
                id: track.id.clone(),
            },
            TrackDraft::from_track(track),
        )
        .await;
    }

    /// Close the form without submitting
    pub async fn cancel_form(&self) {
        self.state.lock().await.form = None;
    }

    pub async fn form(&self) -> Option<FormState> {
        self.state.lock().await.form.clone()
    }

    /// Edit the open draft; returns false when no form is open
    pub async fn update_draft(&self, edit: impl FnOnce(&mut TrackDraft)) -> bool {
        match self.state.lock().await.form.as_mut() {
            Some(form) => {
                edit(&mut form.draft);
                true
            }
            None => false,
        }
    }

    pub async fn toggle_genre(&self, name: &str) -> bool {
        self.update_draft(|draft| draft.toggle_genre(name)).await
    }

    /// Validate and submit the open form
    ///
    /// On success the form closes and the list is patched. On failure the
    /// form stays open with its draft and the error recorded.
    pub async fn submit(&self) -> Result<Track, MutationError> {
        if self.list.is_closed() {
            return Err(MutationError::Closed);
        }

        let (mode, fields, session) = {
            let mut state = self.state.lock().await;
            let form = state.form.as_mut().ok_or(MutationError::NoOpenForm)?;
            if form.submitting {
                debug!("Ignoring submit while a request is outstanding");
                return Err(MutationError::Busy);
            }

            match form.draft.validate() {
                Ok(fields) => {
                    form.field_errors = FieldErrors::default();
                    form.submit_error = None;
                    form.submitting = true;
                    (form.mode.clone(), fields, form.session)
                }
                Err(errors) => {
                    form.field_errors = errors.clone();
                    return Err(MutationError::Invalid(errors));
                }
            }
        };

        let result = match &mode {
            FormMode::Create => self.api.create_track(&fields).await,
            FormMode::Edit { id } => {
                self.api
                    .update_track(id, &TrackPatch::from(fields))
                    .await
            }
        };

        {
            let mut state = self.state.lock().await;
            let same_form = state.form.as_ref().is_some_and(|f| f.session == session);
            match &result {
                Ok(_) if same_form => state.form = None,
                Err(e) if same_form => {
                    if let Some(form) = state.form.as_mut() {
                        form.submitting = false;
                        form.submit_error = Some(e.user_message());
                    }
                }
                _ => {}
            }
        }

        let track = result.map_err(|e| {
            warn!(error = %e, ?mode, "Track submission failed");
            MutationError::Api(e)
        })?;

        match mode {
            FormMode::Create => {
                info!(id = %track.id, "Track created");
                self.list.apply_created(track.clone()).await;
            }
            FormMode::Edit { .. } => {
                info!(id = %track.id, "Track updated");
                self.list.apply_updated(track.clone()).await;
            }
        }
        Ok(track)
    }

    /// Ask for confirmation before deleting `id`
    pub async fn request_delete(&self, id: &str) {
        self.state.lock().await.pending_delete = Some(id.to_string());
    }

    pub async fn pending_delete(&self) -> Option<DeletePrompt> {
        self.state
            .lock()
            .await
            .pending_delete
            .clone()
            .map(|id| DeletePrompt {
                id,
                message: DELETE_CONFIRM_MESSAGE,
            })
    }

    /// Dismiss the confirmation; nothing is sent
    pub async fn cancel_delete(&self) {
        self.state.lock().await.pending_delete = None;
    }

    /// Delete the track awaiting confirmation
    ///
    /// On success the track is removed from the list. On failure the error
    /// is shown as a banner and the track stays.
    pub async fn confirm_delete(&self) -> Result<String, MutationError> {
        if self.list.is_closed() {
            return Err(MutationError::Closed);
        }

        let id = self
            .state
            .lock()
            .await
            .pending_delete
            .take()
            .ok_or(MutationError::NoPendingDelete)?;

        match self.api.delete_track(&id).await {
            Ok(()) => {
                self.list.apply_deleted(&id).await;
                info!(id = %id, "Track deleted");
                Ok(id)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to delete track");
                self.state.lock().await.banner = Some(e.user_message());
                Err(MutationError::Api(e))
            }
        }
    }

    /// Upload an audio file for `id`
    ///
    /// Files outside the audio allow-list are rejected without a request.
    /// Success refreshes the whole list.
    pub async fn upload_audio(&self, id: &str, file: AudioFile) -> Result<Track, MutationError> {
        if self.list.is_closed() {
            return Err(MutationError::Closed);
        }

        {
            let mut state = self.state.lock().await;
            // An in-flight upload keeps its status even if a bad file is picked
            if state.uploads.get(id) == Some(&UploadStatus::Uploading) {
                return Err(MutationError::Busy);
            }
            if !file.is_allowed_type() {
                debug!(id = %id, content_type = %file.content_type, "Rejected upload type");
                state
                    .uploads
                    .insert(id.to_string(), UploadStatus::Failed(UPLOAD_TYPE_MESSAGE.to_string()));
                return Err(MutationError::UnsupportedMediaType(file.content_type));
            }
            state.uploads.insert(id.to_string(), UploadStatus::Uploading);
        }

        match self.api.upload_audio(id, file).await {
            Ok(track) => {
                self.state.lock().await.uploads.remove(id);
                info!(id = %id, "Audio uploaded, refreshing list");
                self.list.refresh().await;
                Ok(track)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Audio upload failed");
                self.state
                    .lock()
                    .await
                    .uploads
                    .insert(id.to_string(), UploadStatus::Failed(e.user_message()));
                Err(MutationError::Api(e))
            }
        }
    }

    pub async fn upload_status(&self, id: &str) -> Option<UploadStatus> {
        self.state.lock().await.uploads.get(id).cloned()
    }

    /// Error banner from the last failed delete
    pub async fn banner(&self) -> Option<String> {
        self.state.lock().await.banner.clone()
    }

    pub async fn clear_banner(&self) {
        self.state.lock().await.banner = None;
    }
}
