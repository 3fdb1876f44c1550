//! Dropbox Revision Downloader
//!
//! Downloads the stored revisions of a single Dropbox file into a folder next
//! to it, one file per revision.
//!
//! # Features
//!
//! - Local path to Dropbox path translation
//! - Revision listing through the Dropbox API v2
//! - Concurrent downloads, at most 20 in flight
//! - Deterministic `<timestamp>---<rev>.<ext>` output names
//! - Cached API key and layered settings resolution
//!
//! # Example
//!
//! ```no_run
//! use dropbox_revisions::{download_revisions, Client, ClientConfig, RevisionPlan};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let plan = RevisionPlan::new(
//!         Path::new("/home/u/Dropbox/notes.txt"),
//!         Path::new("/home/u/Dropbox"),
//!     )?;
//!     let client = Arc::new(Client::new(ClientConfig::new("sl.my-api-key"))?);
//!
//!     let summary = download_revisions(client, &plan, 100, 20, |_| Ok(())).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
mod client;
mod config;
mod connection;
mod errors;
mod operations;
mod protocol;
mod types;

// Re-export public API
pub use client::Client;
pub use config::{home_dir, CredentialCache, Prompter, SettingLayers, TerminalPrompter};
pub use errors::{describe_summary, ErrorKind, Result, RevisionsError};
pub use operations::{
    download_revisions, fetch_revisions, list_revisions, Progress, RevisionPlan, RevisionService,
};
pub use protocol::{
    decode_api_error, destination_folder, file_extension, format_timestamp, header_safe_json,
    remote_path, revision_file_name, DownloadArg, FileMetadata, ListRevisionsArg, ListRevisionsResult,
};
pub use types::{
    ClientConfig, DownloadSummary, RevisionEntry, CREDENTIAL_CACHE_FILE, DEFAULT_N_REVISIONS,
    MAX_CONCURRENT_DOWNLOADS,
};
