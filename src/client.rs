//! Dropbox Client
//!
//! Main client struct implementing the revision service on top of the
//! Dropbox API v2.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::connection::Connection;
use crate::errors::{RevisionsError, Result};
use crate::operations::RevisionService;
use crate::protocol::{
    DownloadArg, ListRevisionsArg, ListRevisionsResult, DOWNLOAD_ROUTE, LIST_REVISIONS_ROUTE,
};
use crate::types::{ClientConfig, RevisionEntry};

/// Dropbox client for revision operations
///
/// The client is cheap to share behind an `Arc`; every download task uses the
/// same connection pool.
///
/// # Example
///
/// ```no_run
/// use dropbox_revisions::{Client, ClientConfig, RevisionService};
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new(ClientConfig::new("sl.my-api-key"))?;
///
///     let entries = client.list_revisions("/notes.txt", 10).await?;
///     if let Some(latest) = entries.first() {
///         client
///             .download_revision("/notes.txt", &latest.rev, Path::new("notes.latest.txt"))
///             .await?;
///     }
///     Ok(())
/// }
/// ```
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Creates a new Dropbox client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::validate_config(&config)?;
        Ok(Self {
            conn: Connection::new(&config)?,
        })
    }

    fn validate_config(config: &ClientConfig) -> Result<()> {
        if config.api_key.trim().is_empty() {
            return Err(RevisionsError::Config(
                "API key is required".to_string(),
            ));
        }
        for url in [&config.api_url, &config.content_url] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(RevisionsError::Config(format!(
                    "Invalid endpoint URL: {}",
                    url
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RevisionService for Client {
    async fn list_revisions(&self, remote_path: &str, limit: u32) -> Result<Vec<RevisionEntry>> {
        let result: ListRevisionsResult = self
            .conn
            .rpc(LIST_REVISIONS_ROUTE, &ListRevisionsArg::new(remote_path, limit))
            .await?;

        debug!(
            remote_path,
            is_deleted = result.is_deleted,
            entries = result.entries.len(),
            "listed revisions"
        );
        Ok(result.entries.into_iter().map(RevisionEntry::from).collect())
    }

    async fn download_revision(&self, remote_path: &str, rev: &str, dest: &Path) -> Result<()> {
        let bytes = self
            .conn
            .download_to_file(DOWNLOAD_ROUTE, &DownloadArg { path: remote_path, rev }, dest)
            .await?;

        debug!(rev, bytes, dest = %dest.display(), "downloaded revision");
        Ok(())
    }
}
