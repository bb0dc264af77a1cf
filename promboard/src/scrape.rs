//! Metrics snapshot retrieval.
//!
//! One GET of the exposition text with an explicit timeout, no retries; a
//! failed fetch fails the run. A local file can stand in for the endpoint
//! when working from a saved snapshot.

use std::path::Path;
use std::time::Duration;

use tracing::info;

/// Errors produced while retrieving a metrics snapshot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request did not complete, including timeout expiry
    #[error("request to {uri} failed: {source}")]
    Request {
        /// Endpoint that was contacted
        uri: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-success status
    #[error("{uri} answered with status {status}")]
    Status {
        /// Endpoint that was contacted
        uri: String,
        /// Status code of the response
        status: reqwest::StatusCode,
    },
    /// The response body could not be read
    #[error("failed to read response body from {uri}: {source}")]
    Body {
        /// Endpoint that was contacted
        uri: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },
    /// The snapshot file could not be read
    #[error("failed to read snapshot file {path}: {source}")]
    File {
        /// Path that was read
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Fetch the exposition text from `uri`, giving up after `timeout`.
///
/// # Errors
///
/// Fails when the request errors or times out, when the endpoint answers
/// with a non-success status, or when the body cannot be read.
pub async fn fetch(
    client: &reqwest::Client,
    uri: &str,
    timeout: Duration,
) -> Result<String, Error> {
    info!("downloading metrics from endpoint: {uri}");

    let response = client
        .get(uri)
        .timeout(timeout)
        .send()
        .await
        .map_err(|source| Error::Request {
            uri: uri.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            uri: uri.to_string(),
            status,
        });
    }

    response.text().await.map_err(|source| Error::Body {
        uri: uri.to_string(),
        source,
    })
}

/// Read an exposition snapshot from a local file.
///
/// # Errors
///
/// Fails when the file cannot be read.
pub async fn read_file(path: &Path) -> Result<String, Error> {
    info!("reading metrics snapshot from {}", path.display());

    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::File {
            path: path.display().to_string(),
            source,
        })
}
