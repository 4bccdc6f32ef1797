//! Reading local files into upload payloads

use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{TransferError, TransferResult};
use crate::sniff::detect_content_type;

/// A local file read fully into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    /// Base name of the file, used as the object key
    pub name: String,
    /// Length in bytes
    pub size: u64,
    /// Sniffed MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Opens `path`, reads it completely and sniffs its content type
///
/// The file handle is dropped before this function returns, on success and on
/// every error path.
///
/// # Errors
///
/// Returns `TransferError::LocalIo` if the file cannot be opened, stat'd or read,
/// and `TransferError::Config` if the path has no usable file name
pub async fn inspect_file(path: impl AsRef<Path>) -> TransferResult<FilePayload> {
    let path = path.as_ref();

    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToString::to_string)
        .ok_or_else(|| {
            TransferError::Config(format!("{} has no valid file name", path.display()))
        })?;

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| TransferError::local_io(path, e))?;

    let metadata = file
        .metadata()
        .await
        .map_err(|e| TransferError::local_io(path, e))?;

    if !metadata.is_file() {
        return Err(TransferError::local_io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let mut bytes = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or_default());
    file.read_to_end(&mut bytes)
        .await
        .map_err(|e| TransferError::local_io(path, e))?;

    let content_type = detect_content_type(&bytes).to_string();
    let size = bytes.len() as u64;

    debug!(
        file = %path.display(),
        size,
        content_type = %content_type,
        "Inspected local file"
    );

    Ok(FilePayload {
        name,
        size,
        content_type,
        bytes,
    })
}
