//! # Trackshelf Common Library
//!
//! Shared code for the Trackshelf crates:
//! - Track, genre and query types
//! - Pagination arithmetic
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod time;

pub use error::{Error, Result};
pub use models::{Genre, PageResult, PaginatedResponse, Track, TrackFields, TrackPatch, TrackQuery};
