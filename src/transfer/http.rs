//! HTTP client helpers shared by the transfer queue and the fetching stages

use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::debug;
use url::Url;

use super::TransferError;
use crate::config::HTTP_CONNECT_TIMEOUT_SECS;

/// Build the HTTP client injected into the queue and the stages.
///
/// Configured with explicit timeouts to prevent indefinite hangs; there is no
/// mid-flight cancellation beyond `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS).min(timeout))
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// GET `url`, failing on transport errors and non-2xx statuses.
pub async fn get(client: &Client, url: &Url) -> Result<Response, TransferError> {
    debug!("GET {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| TransferError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::Status {
            url: url.to_string(),
            status,
        });
    }

    Ok(response)
}

/// Expose a response body as an async buffered reader so extractors can
/// tokenize it while it downloads.
pub fn body_reader(response: Response) -> impl AsyncBufRead + Unpin + Send {
    let stream = response.bytes_stream().map_err(std::io::Error::other);
    StreamReader::new(Box::pin(stream))
}

/// Download `url` into `target`, creating parent directories.
///
/// The body is streamed into `<target>.part` and renamed on success, so an
/// interrupted transfer never leaves a truncated file under the final name.
/// Returns the number of bytes written.
pub async fn download(client: &Client, url: &Url, target: &Path) -> Result<u64, TransferError> {
    let response = get(client, url).await?;

    let io_err = |source| TransferError::Io {
        path: target.to_path_buf(),
        source,
    };

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let partial = partial_path(target);
    let result = write_body(response, url, &partial).await;
    match result {
        Ok(written) => {
            tokio::fs::rename(&partial, target).await.map_err(io_err)?;
            Ok(written)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

async fn write_body(response: Response, url: &Url, path: &Path) -> Result<u64, TransferError> {
    let io_err = |source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| TransferError::Network {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    Ok(written)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
