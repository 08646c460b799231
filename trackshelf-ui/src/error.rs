//! Error types for trackshelf-ui
//!
//! [`ApiError`] covers one backend round trip. [`MutationError`] covers a
//! coordinator operation, which may fail locally before any request is made.

use crate::forms::FieldErrors;
use thiserror::Error;

/// Broad error class of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-2xx response, transport failure or undecodable body
    Request,
    /// Backend rejected the payload
    Validation,
    /// Target id does not exist
    NotFound,
}

/// Backend API errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed ({0}): {1}")]
    Request(u16, String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Client could not be built from the configured base URL
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Network(_)
            | ApiError::Request(_, _)
            | ApiError::Parse(_)
            | ApiError::InvalidBaseUrl(_) => ErrorKind::Request,
        }
    }

    /// Message shown to the user: the backend's `error` string when it sent
    /// one, otherwise a generic description
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Request(_, message)
            | ApiError::Validation(message)
            | ApiError::NotFound(message) => message.clone(),
            ApiError::Network(_) => "Could not reach the server".to_string(),
            ApiError::Parse(_) => "Unexpected response from the server".to_string(),
            ApiError::InvalidBaseUrl(message) => format!("Invalid API base URL: {}", message),
        }
    }
}

/// Errors from mutation coordinator operations
#[derive(Debug, Error)]
pub enum MutationError {
    /// Submit called with no form open
    #[error("No form is open")]
    NoOpenForm,

    /// A request for the same form or track is still outstanding
    #[error("A request is already in progress")]
    Busy,

    /// Local validation failed; nothing was sent
    #[error("Form is invalid: {0}")]
    Invalid(FieldErrors),

    /// Upload rejected before sending
    #[error("Please upload MP3 or WAV file (got {0})")]
    UnsupportedMediaType(String),

    /// Confirm called without a pending delete
    #[error("No delete is awaiting confirmation")]
    NoPendingDelete,

    /// Coordinator was closed
    #[error("Controller is closed")]
    Closed,

    #[error(transparent)]
    Api(#[from] ApiError),
}
