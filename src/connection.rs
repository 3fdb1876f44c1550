//! Dropbox HTTP Transport
//!
//! This module wraps a shared `reqwest::Client` with the API key and base URLs,
//! and implements the two request styles Dropbox uses: RPC calls with a JSON
//! body and content downloads with the argument in a header.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::{RevisionsError, Result};
use crate::protocol::{decode_api_error, header_safe_json, API_ARG_HEADER};
use crate::types::{ClientConfig, PARTIAL_SUFFIX};

/// Authenticated connection to the Dropbox API
///
/// The underlying `reqwest::Client` pools connections and is safe to share
/// across tasks.
pub struct Connection {
    http: reqwest::Client,
    api_url: String,
    content_url: String,
}

impl Connection {
    /// Creates a connection from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| RevisionsError::Config("API key contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| RevisionsError::Config("invalid user agent".into()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            content_url: config.content_url.trim_end_matches('/').to_string(),
        })
    }

    /// Performs an RPC call: JSON request body in, JSON response body out
    pub async fn rpc<A, R>(&self, route: &str, arg: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/2/{}", self.api_url, route);
        let resp = self.http.post(&url).json(arg).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(decode_api_error(route, status.as_u16(), &body));
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| RevisionsError::Api {
            endpoint: route.to_string(),
            status: status.as_u16(),
            summary: format!("malformed response body: {}", e),
        })
    }

    /// Performs a content download, streaming the body into `dest`
    ///
    /// The body is written to `<dest>.part` and renamed onto `dest` once
    /// complete, so `dest` never holds a partial download. Nothing is created
    /// when the server rejects the request. Returns the number of bytes
    /// written.
    pub async fn download_to_file<A>(&self, route: &str, arg: &A, dest: &Path) -> Result<u64>
    where
        A: Serialize + ?Sized,
    {
        let url = format!("{}/2/{}", self.content_url, route);
        let arg = header_safe_json(arg)?;
        let resp = self
            .http
            .post(&url)
            .header(API_ARG_HEADER, arg)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(decode_api_error(route, status.as_u16(), &body));
        }

        let partial = partial_path(dest);
        match write_body(resp, &partial).await {
            Ok(written) => {
                tokio::fs::rename(&partial, dest).await?;
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

/// Returns the path a download is staged at: `<dest>.part`
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

async fn write_body(mut resp: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
