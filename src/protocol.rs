//! Dropbox Protocol Encoding and Decoding
//!
//! This module holds the Dropbox API v2 wire types, the encoding of the
//! `Dropbox-API-Arg` header, decoding of API error bodies, and the mapping
//! between local paths and Dropbox paths and output file names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use crate::errors::{RevisionsError, Result};
use crate::types::*;

/// RPC route listing the revisions of a file
pub const LIST_REVISIONS_ROUTE: &str = "files/list_revisions";
/// Content route downloading a file
pub const DOWNLOAD_ROUTE: &str = "files/download";
/// Header carrying the JSON argument of content routes
pub const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// Request body of `files/list_revisions`
#[derive(Debug, Serialize)]
pub struct ListRevisionsArg<'a> {
    /// Dropbox path of the file
    pub path: &'a str,
    /// Always `path`: revisions of whatever lives at this path
    pub mode: &'static str,
    /// Maximum number of entries to return
    pub limit: u32,
}

impl<'a> ListRevisionsArg<'a> {
    /// Creates a request in `path` mode
    pub fn new(path: &'a str, limit: u32) -> Self {
        Self {
            path,
            mode: "path",
            limit,
        }
    }
}

/// Response body of `files/list_revisions`
#[derive(Debug, Deserialize)]
pub struct ListRevisionsResult {
    /// Whether the file is currently deleted
    pub is_deleted: bool,
    /// When the file was deleted, if it is
    pub server_deleted: Option<DateTime<Utc>>,
    /// Revisions, newest first
    pub entries: Vec<FileMetadata>,
}

/// Metadata of a single file revision
///
/// Only the fields the downloader uses are decoded; the rest of the
/// Dropbox `FileMetadata` object is ignored.
#[derive(Debug, Deserialize)]
pub struct FileMetadata {
    /// Time the revision was stored on the server
    pub server_modified: DateTime<Utc>,
    /// Revision identifier
    pub rev: String,
    /// Size in bytes
    pub size: Option<u64>,
    /// Dropbox content hash
    pub content_hash: Option<String>,
}

impl From<FileMetadata> for RevisionEntry {
    fn from(meta: FileMetadata) -> Self {
        RevisionEntry {
            server_modified: meta.server_modified,
            rev: meta.rev,
            size: meta.size,
            content_hash: meta.content_hash,
        }
    }
}

/// Argument of `files/download`, sent in the `Dropbox-API-Arg` header
#[derive(Debug, Serialize)]
pub struct DownloadArg<'a> {
    /// Dropbox path of the file
    pub path: &'a str,
    /// Revision to download
    pub rev: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_summary: String,
}

/// Builds an API error from a non-success response
///
/// Dropbox route errors (HTTP 409) and auth errors (HTTP 401) carry a JSON body
/// with an `error_summary`; other failures carry plain text.
pub fn decode_api_error(endpoint: &str, status: u16, body: &[u8]) -> RevisionsError {
    let summary = match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error_summary,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };
    RevisionsError::Api {
        endpoint: endpoint.to_string(),
        status,
        summary,
    }
}

/// Serializes a value to JSON that is safe to place in an HTTP header
///
/// Non-ASCII characters are escaped as `\uXXXX`, using surrogate pairs
/// outside the basic multilingual plane.
pub fn header_safe_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in ch.encode_utf16(&mut units) {
            let _ = write!(out, "\\u{:04x}", unit);
        }
    }
    Ok(out)
}

/// Translates a local file path into the Dropbox path it is synced to
///
/// Each component of `path` relative to `root` is prefixed with `/`, so
/// `/home/u/Dropbox/docs/file.txt` under `/home/u/Dropbox` becomes
/// `/docs/file.txt`.
pub fn remote_path(path: &Path, root: &Path) -> Result<String> {
    let outside = || RevisionsError::PathOutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };

    let relative = path.strip_prefix(root).map_err(|_| outside())?;

    let mut remote = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| RevisionsError::NonUtf8Path(path.to_path_buf()))?;
                remote.push('/');
                remote.push_str(part);
            }
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }
    Ok(remote)
}

/// Returns the folder revisions of `path` are written to: `<path>.revisions`
pub fn destination_folder(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(REVISIONS_FOLDER_SUFFIX);
    PathBuf::from(name)
}

/// Returns the extension of `path` without the leading dot
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .filter(|ext| !ext.is_empty())
}

/// Renders a timestamp for use in a file name
///
/// The ISO-8601 form is used with `T` and `:` replaced by `-`, e.g.
/// `2015-05-12-15-50-38`. Fractional seconds appear only when non-zero.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .format("%Y-%m-%dT%H:%M:%S%.f")
        .to_string()
        .replace(['T', ':'], "-")
}

/// Builds the output file name of a revision
///
/// The format is `<timestamp>---<rev>.<extension>`. Names are unique because
/// revision ids are; timestamps may repeat.
pub fn revision_file_name(entry: &RevisionEntry, extension: Option<&str>) -> String {
    let mut name = format!(
        "{}{}{}",
        format_timestamp(&entry.server_modified),
        NAME_SEPARATOR,
        entry.rev
    );
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(ext);
    }
    name
}
