//! Shared Types and Constants
//!
//! This module defines the constants, revision descriptors and client
//! configuration used throughout the crate.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Default Dropbox API endpoint for RPC-style calls
pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com";
/// Default Dropbox API endpoint for content downloads
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com";

/// Default number of revisions requested
pub const DEFAULT_N_REVISIONS: u32 = 100;
/// Maximum number of downloads in flight at once
pub const MAX_CONCURRENT_DOWNLOADS: usize = 20;

/// Environment variable overriding the local Dropbox root
pub const DROPBOX_ROOT_ENV: &str = "DROPBOX";
/// Name of the Dropbox folder inside the home directory
pub const DEFAULT_DROPBOX_DIR: &str = "Dropbox";
/// Name of the credential cache file inside the home directory
pub const CREDENTIAL_CACHE_FILE: &str = ".dropbox_download_revisions";
/// Suffix appended to the original file name to build the destination folder
pub const REVISIONS_FOLDER_SUFFIX: &str = ".revisions";
/// Suffix of a download that is still being written
pub const PARTIAL_SUFFIX: &str = ".part";
/// Separator between timestamp and revision id in output names
pub const NAME_SEPARATOR: &str = "---";

/// One stored revision of a Dropbox file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionEntry {
    /// Time the revision was stored on the server
    pub server_modified: DateTime<Utc>,
    /// Opaque revision identifier
    pub rev: String,
    /// Size in bytes, when reported
    pub size: Option<u64>,
    /// Dropbox content hash, when reported
    pub content_hash: Option<String>,
}

impl RevisionEntry {
    /// Creates a descriptor from a timestamp and revision id
    pub fn new(server_modified: DateTime<Utc>, rev: impl Into<String>) -> Self {
        Self {
            server_modified,
            rev: rev.into(),
            size: None,
            content_hash: None,
        }
    }
}

/// Client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// OAuth access token sent as a bearer credential
    pub api_key: String,
    /// Base URL for RPC endpoints
    pub api_url: String,
    /// Base URL for content endpoints
    pub content_url: String,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a new client configuration for the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            content_url: DEFAULT_CONTENT_URL.to_string(),
            user_agent: concat!("dropbox-revisions/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Sets the base URL for RPC endpoints
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the base URL for content endpoints
    pub fn with_content_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = url.into();
        self
    }

    /// Sets the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Number of revisions written
    pub count: usize,
    /// Folder the revisions were written to
    pub destination: PathBuf,
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downloaded {} revisions to {}",
            self.count,
            self.destination.display()
        )
    }
}
