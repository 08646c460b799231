//! # Trackshelf UI layer
//!
//! Client-side data-fetch and state-synchronization for the tracks backend:
//! - `debounce`: quiet-period propagation of search input
//! - `api`: typed backend operations behind the [`api::TrackApi`] trait
//! - `list_controller`: current page, filters, stale-response guard
//! - `mutations`: create/edit/delete/upload with local reconciliation
//! - `forms`: track draft and per-field validation

pub mod api;
pub mod debounce;
pub mod error;
pub mod forms;
pub mod list_controller;
pub mod mutations;

pub use api::{AudioFile, HttpTrackApi, TrackApi};
pub use debounce::Debouncer;
pub use error::{ApiError, ErrorKind, MutationError};
pub use list_controller::{FetchOutcome, ListController, ListView, LoadPhase};
pub use mutations::MutationCoordinator;
