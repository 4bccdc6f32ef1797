//! Executing presigned requests over plain HTTP

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE, HOST},
    StatusCode,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{TransferError, TransferResult};
use crate::store::{PresignMethod, PresignedRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a completed presigned download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReceipt {
    /// Status returned by the store
    pub status: StatusCode,
    /// Bytes written to the destination file
    pub bytes_written: u64,
}

/// Performs the HTTP side of presigned transfers
///
/// Holds nothing but an HTTP client, so it can be shared freely. No retries are
/// attempted; a failed transfer is reported to the caller as is.
#[derive(Debug, Clone)]
pub struct TransferExecutor {
    http_client: reqwest::Client,
}

impl TransferExecutor {
    /// Creates an executor with a default HTTP client
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Config` if the HTTP client cannot be built
    pub fn new() -> TransferResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransferError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(http_client))
    }

    /// Creates an executor around an existing HTTP client
    #[must_use]
    pub const fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Uploads `bytes` to a presigned PUT URL
    ///
    /// Sends `Content-Type` and `Content-Length` and returns the response status.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::StoreUnreachable` if the request could not be sent,
    /// or the classified store response if the status is not 2xx
    #[instrument(skip(self, url, bytes), fields(size = bytes.len()))]
    pub async fn execute_put(
        &self,
        url: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> TransferResult<StatusCode> {
        let request = self
            .http_client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, bytes.len())
            .body(bytes);

        Self::send_put(request).await
    }

    /// Uploads `bytes` using a presigned PUT, sending every header it was signed with
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Config` if `presigned` is not a PUT, otherwise the
    /// same errors as [`Self::execute_put`]
    pub async fn execute_presigned_put(
        &self,
        presigned: &PresignedRequest,
        bytes: Vec<u8>,
    ) -> TransferResult<StatusCode> {
        if presigned.method != PresignMethod::Put {
            return Err(TransferError::Config(format!(
                "Expected a presigned PUT for {}, got {}",
                presigned.key, presigned.method
            )));
        }

        let mut request = self.http_client.put(&presigned.url);
        for (name, value) in &presigned.headers {
            // Host comes from the URL and the body determines the length
            if name.eq_ignore_ascii_case(HOST.as_str())
                || name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str())
            {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        Self::send_put(request.body(bytes)).await
    }

    async fn send_put(request: reqwest::RequestBuilder) -> TransferResult<StatusCode> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Presigned upload failed with status {}", status);
            return Err(TransferError::from_response(status.as_u16(), &body));
        }

        info!("Presigned upload completed with status {}", status);
        Ok(status)
    }

    /// Downloads a presigned GET URL into `destination`
    ///
    /// The destination is only created once the store answered 200, and any
    /// existing file is truncated. A download that fails midway removes the
    /// partial file.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::StoreUnreachable` if the request could not be sent,
    /// the classified store response if the status is not 200, and
    /// `TransferError::LocalIo` if the destination cannot be written
    #[instrument(skip(self, url, destination), fields(destination = %destination.as_ref().display()))]
    pub async fn execute_get(
        &self,
        url: &str,
        destination: impl AsRef<Path>,
    ) -> TransferResult<DownloadReceipt> {
        let destination = destination.as_ref();
        let response = self.http_client.get(url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Presigned download failed with status {}", status);
            return Err(TransferError::from_response(status.as_u16(), &body));
        }

        match Self::stream_to_file(response, destination).await {
            Ok(bytes_written) => {
                info!(
                    "Downloaded {} bytes to {}",
                    bytes_written,
                    destination.display()
                );
                Ok(DownloadReceipt {
                    status,
                    bytes_written,
                })
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(destination).await {
                    debug!("Could not remove partial download: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    /// Downloads using a presigned GET
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Config` if `presigned` is not a GET, otherwise the
    /// same errors as [`Self::execute_get`]
    pub async fn execute_presigned_get(
        &self,
        presigned: &PresignedRequest,
        destination: impl AsRef<Path>,
    ) -> TransferResult<DownloadReceipt> {
        if presigned.method != PresignMethod::Get {
            return Err(TransferError::Config(format!(
                "Expected a presigned GET for {}, got {}",
                presigned.key, presigned.method
            )));
        }

        self.execute_get(&presigned.url, destination).await
    }

    async fn stream_to_file(response: reqwest::Response, destination: &Path) -> TransferResult<u64> {
        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| TransferError::local_io(destination, e))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::local_io(destination, e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| TransferError::local_io(destination, e))?;

        Ok(written)
    }
}
