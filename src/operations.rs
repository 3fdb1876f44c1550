//! Revision Operations
//!
//! This module defines the remote service contract and implements the
//! download pipeline: resolve the Dropbox path, list the revisions, then fetch
//! every revision into a fresh folder with a bounded number of concurrent
//! downloads.

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::{RevisionsError, Result};
use crate::protocol::{destination_folder, file_extension, remote_path, revision_file_name};
use crate::types::{DownloadSummary, RevisionEntry};

/// The two operations the download pipeline needs from Dropbox
///
/// Implementations must be shareable across tasks: every download of a run
/// goes through the same instance.
#[async_trait]
pub trait RevisionService: Send + Sync {
    /// Lists up to `limit` revisions of `remote_path`, newest first
    async fn list_revisions(&self, remote_path: &str, limit: u32) -> Result<Vec<RevisionEntry>>;

    /// Downloads revision `rev` of `remote_path` into the file `dest`
    async fn download_revision(&self, remote_path: &str, rev: &str, dest: &Path) -> Result<()>;
}

/// Everything derived from the local file before talking to Dropbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPlan {
    /// Absolute path of the local file
    pub local_file: PathBuf,
    /// Dropbox path of the file
    pub remote_path: String,
    /// Folder the revisions are written to
    pub destination: PathBuf,
    /// Extension copied onto every output file
    pub extension: Option<String>,
}

impl RevisionPlan {
    /// Checks the preconditions of a run and resolves the Dropbox path
    ///
    /// Fails if `<local_file>.revisions` already exists or if `local_file` is
    /// not under `dropbox_root`. Nothing is created here.
    pub fn new(local_file: &Path, dropbox_root: &Path) -> Result<Self> {
        let destination = destination_folder(local_file);
        ensure_absent(&destination)?;

        let remote_path = remote_path(local_file, dropbox_root)?;

        Ok(Self {
            local_file: local_file.to_path_buf(),
            remote_path,
            extension: file_extension(local_file),
            destination,
        })
    }

    /// Returns the output path for a revision
    pub fn output_path(&self, entry: &RevisionEntry) -> PathBuf {
        self.destination
            .join(revision_file_name(entry, self.extension.as_deref()))
    }
}

fn ensure_absent(destination: &Path) -> Result<()> {
    match std::fs::symlink_metadata(destination) {
        Ok(_) => Err(RevisionsError::DestinationExists(destination.to_path_buf())),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Pipeline milestones reported to the caller
#[derive(Debug)]
pub enum Progress<'a> {
    /// The listing request is about to be sent
    Listing {
        /// Dropbox path being listed
        remote_path: &'a str,
    },
    /// The listing succeeded
    Listed {
        /// Revisions returned by Dropbox
        entries: &'a [RevisionEntry],
    },
    /// Downloads are about to start
    Downloading {
        /// Number of revisions to fetch
        count: usize,
    },
}

/// Lists up to `limit` revisions of the planned file
pub async fn list_revisions<S>(service: &S, plan: &RevisionPlan, limit: u32) -> Result<Vec<RevisionEntry>>
where
    S: RevisionService + ?Sized,
{
    info!(remote_path = %plan.remote_path, limit, "listing revisions");
    let entries = service.list_revisions(&plan.remote_path, limit).await?;
    info!(count = entries.len(), "received revision list");
    Ok(entries)
}

/// Downloads every revision into the plan's destination folder
///
/// The destination folder is created first and must not exist. At most
/// `concurrency` downloads are in flight at any time. After the first
/// failure, in completion order, no further download is started; the ones
/// already issued run to completion before that failure is returned. Files
/// already written stay on disk.
///
/// Returns the paths of the written files in completion order.
pub async fn fetch_revisions<S>(
    service: Arc<S>,
    plan: &RevisionPlan,
    entries: Vec<RevisionEntry>,
    concurrency: usize,
) -> Result<Vec<PathBuf>>
where
    S: RevisionService + ?Sized + 'static,
{
    tokio::fs::create_dir(&plan.destination)
        .await
        .map_err(|e| match e.kind() {
            IoErrorKind::AlreadyExists => {
                RevisionsError::DestinationExists(plan.destination.clone())
            }
            _ => RevisionsError::Io(e),
        })?;

    let remote_path: Arc<str> = Arc::from(plan.remote_path.as_str());
    let concurrency = concurrency.max(1);

    let mut pending = entries.into_iter();
    let mut in_flight = FuturesUnordered::new();
    let mut written = Vec::new();
    let mut first_error = None;

    loop {
        // No new downloads once one has failed; the ones in flight still finish
        while first_error.is_none() && in_flight.len() < concurrency {
            let Some(entry) = pending.next() else { break };
            let service = Arc::clone(&service);
            let remote_path = Arc::clone(&remote_path);
            let dest = plan.output_path(&entry);
            in_flight.push(tokio::spawn(async move {
                debug!(
                    rev = %entry.rev,
                    size = ?entry.size,
                    content_hash = ?entry.content_hash,
                    dest = %dest.display(),
                    "downloading revision"
                );
                service
                    .download_revision(&remote_path, &entry.rev, &dest)
                    .await?;
                Ok::<_, RevisionsError>(dest)
            }));
        }

        let Some(joined) = in_flight.next().await else { break };
        let result = joined.unwrap_or_else(|e| Err(RevisionsError::Task(e.to_string())));
        match result {
            Ok(dest) => written.push(dest),
            Err(e) if first_error.is_none() => {
                warn!(error = %e, in_flight = in_flight.len(), "download failed, waiting for downloads in flight");
                first_error = Some(e);
            }
            Err(e) => warn!(error = %e, "further download failed"),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(written),
    }
}

/// Runs the whole pipeline: list, then fetch
///
/// `on_progress` is invoked at each milestone; an error returned from it
/// aborts the run. The destination is checked again before listing so that
/// no remote call is made when it already exists.
pub async fn download_revisions<S, F>(
    service: Arc<S>,
    plan: &RevisionPlan,
    limit: u32,
    concurrency: usize,
    mut on_progress: F,
) -> Result<DownloadSummary>
where
    S: RevisionService + ?Sized + 'static,
    F: FnMut(Progress<'_>) -> Result<()>,
{
    ensure_absent(&plan.destination)?;

    on_progress(Progress::Listing {
        remote_path: &plan.remote_path,
    })?;
    let entries = list_revisions(service.as_ref(), plan, limit).await?;
    on_progress(Progress::Listed { entries: &entries })?;

    on_progress(Progress::Downloading {
        count: entries.len(),
    })?;
    let written = fetch_revisions(service, plan, entries, concurrency).await?;

    info!(count = written.len(), destination = %plan.destination.display(), "revisions downloaded");
    Ok(DownloadSummary {
        count: written.len(),
        destination: plan.destination.clone(),
    })
}
