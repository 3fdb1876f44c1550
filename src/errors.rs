//! Error Definitions
//!
//! This module defines all error types for the revision downloader.
//! Errors are grouped into precondition errors (nothing has been touched yet),
//! remote errors (the Dropbox API or the network failed), configuration errors
//! and local I/O errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for revision operations
pub type Result<T> = std::result::Result<T, RevisionsError>;

/// Base error type for all revision download errors
#[derive(Error, Debug)]
pub enum RevisionsError {
    /// The local file is not located under the configured Dropbox root
    #[error("{path} is not inside the Dropbox folder {root}")]
    PathOutsideRoot {
        /// Absolute path of the local file
        path: PathBuf,
        /// Configured local Dropbox root
        root: PathBuf,
    },

    /// The given path does not exist or is not a regular file
    #[error("{0} is not a file")]
    NotAFile(PathBuf),

    /// A path component cannot be represented as UTF-8
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    /// The revisions folder already exists
    #[error("{0} already exists")]
    DestinationExists(PathBuf),

    /// The Dropbox API answered with a non-success status
    #[error("Dropbox API error on {endpoint} (HTTP {status}): {summary}")]
    Api {
        /// API route that failed, e.g. `files/list_revisions`
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// `error_summary` from the response body, or the raw body
        summary: String,
    },

    /// Transport-level failure talking to Dropbox
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// A download task panicked or was aborted
    #[error("Download task failed: {0}")]
    Task(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`RevisionsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised before any side effect was performed
    Precondition,
    /// Raised by the listing or download calls
    Remote,
    /// Raised while resolving settings
    Config,
    /// Local filesystem or serialization failure
    Io,
}

impl RevisionsError {
    /// Returns the category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            RevisionsError::PathOutsideRoot { .. }
            | RevisionsError::NotAFile(_)
            | RevisionsError::NonUtf8Path(_)
            | RevisionsError::DestinationExists(_) => ErrorKind::Precondition,
            RevisionsError::Api { .. } | RevisionsError::Http(_) | RevisionsError::Task(_) => {
                ErrorKind::Remote
            }
            RevisionsError::Config(_) => ErrorKind::Config,
            RevisionsError::Io(_) | RevisionsError::Json(_) => ErrorKind::Io,
        }
    }
}

/// Maps a Dropbox `error_summary` to a short human readable hint
///
/// Summaries look like `path/not_found/..` or `invalid_access_token/...`.
/// Unknown summaries yield `None`.
pub fn describe_summary(summary: &str) -> Option<&'static str> {
    let tag = summary.split('/').next().unwrap_or_default();
    match tag {
        "path" if summary.starts_with("path/not_found") => Some("file not found in Dropbox"),
        "path" if summary.starts_with("path/not_file") => Some("path is not a file"),
        "invalid_access_token" => Some("the API key is invalid"),
        "expired_access_token" => Some("the API key has expired"),
        "missing_scope" => Some("the API key lacks the files.content.read scope"),
        "too_many_requests" | "too_many_write_operations" => Some("rate limited by Dropbox"),
        _ => None,
    }
}
