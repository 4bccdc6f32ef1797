//! The upload and download workflow, one mode at a time
//!
//! Each mode runs its steps strictly in sequence. Errors are returned to the
//! caller untouched so the entry point decides whether to abort or report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use object_transfer::{
    inspect_file, FilePayload, ObjectMetadata, ObjectStore, PresignMethod, PresignedRequest,
    PutConstraints, TransferExecutor, TransferResult,
};
use tracing::info;

/// What a single workflow run should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Upload a local file through the SDK
    DirectUpload {
        /// File to upload
        source: PathBuf,
        /// Object key, defaults to the file's base name
        key: Option<String>,
    },
    /// Presign a PUT for a local file and upload it over HTTP
    PresignedUpload {
        /// File to upload
        source: PathBuf,
        /// Object key, defaults to the file's base name
        key: Option<String>,
    },
    /// Presign a GET and download the object over HTTP
    PresignedDownload {
        /// Object key
        key: String,
        /// Where to write the object
        destination: PathBuf,
    },
    /// Only generate a presigned URL
    Presign {
        /// Method to authorize
        method: PresignMethod,
        /// Object key
        key: String,
        /// Validity window, defaults to the configured expiry
        ttl: Option<Duration>,
    },
    /// Show an object's metadata
    Stat {
        /// Object key
        key: String,
    },
    /// Create the configured bucket if it is missing
    EnsureBucket,
}

/// Result of a workflow run
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A file was uploaded through the SDK
    Uploaded {
        /// Object key
        key: String,
        /// Bytes uploaded
        size: u64,
        /// Sniffed content type
        content_type: String,
    },
    /// A file was uploaded through a presigned PUT
    PresignedUploaded {
        /// The presigned request that was executed
        presigned: PresignedRequest,
        /// HTTP status returned by the store
        status: u16,
    },
    /// An object was downloaded through a presigned GET
    Downloaded {
        /// The presigned request that was executed
        presigned: PresignedRequest,
        /// Where the object was written
        destination: PathBuf,
        /// HTTP status returned by the store
        status: u16,
        /// Bytes written
        bytes_written: u64,
    },
    /// A presigned URL was generated
    Presigned(PresignedRequest),
    /// Object metadata
    Metadata(ObjectMetadata),
    /// Bucket check finished
    BucketReady {
        /// Bucket name
        bucket: String,
        /// Whether this run created it
        created: bool,
    },
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploaded {
                key,
                size,
                content_type,
            } => write!(f, "Uploaded {key} ({size} bytes, {content_type}) directly"),
            Self::PresignedUploaded { presigned, status } => write!(
                f,
                "Uploaded {} through presigned URL with status {status}\nPresigned URL for PUT: {}",
                presigned.key, presigned.url
            ),
            Self::Downloaded {
                presigned,
                destination,
                status,
                bytes_written,
            } => write!(
                f,
                "Downloaded {} to {} ({bytes_written} bytes) with status {status}\nPresigned URL for GET: {}",
                presigned.key,
                destination.display(),
                presigned.url
            ),
            Self::Presigned(presigned) => write!(
                f,
                "Presigned URL for {} (expires {}): {}",
                presigned.method,
                presigned.expires_at.to_rfc3339(),
                presigned.url
            ),
            Self::Metadata(metadata) => write!(
                f,
                "{}: {} bytes, content type {}, etag {}",
                metadata.key,
                metadata.size,
                metadata.content_type.as_deref().unwrap_or("unknown"),
                metadata.etag.as_deref().unwrap_or("none")
            ),
            Self::BucketReady { bucket, created } => {
                if *created {
                    write!(f, "Created bucket {bucket}")
                } else {
                    write!(f, "Bucket {bucket} already exists")
                }
            }
        }
    }
}

/// Runs workflow modes against one store
pub struct Workflow {
    store: ObjectStore,
    executor: TransferExecutor,
    presign_ttl: Duration,
}

impl Workflow {
    /// Creates a workflow
    ///
    /// # Arguments
    ///
    /// * `store` - Store handle for direct calls and signing
    /// * `executor` - HTTP side of presigned transfers
    /// * `presign_ttl` - Expiry of generated URLs unless a mode overrides it
    #[must_use]
    pub const fn new(store: ObjectStore, executor: TransferExecutor, presign_ttl: Duration) -> Self {
        Self {
            store,
            executor,
            presign_ttl,
        }
    }

    /// Store this workflow operates on
    #[must_use]
    pub const fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Executes one mode
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step
    pub async fn run(&self, mode: Mode) -> TransferResult<Outcome> {
        match mode {
            Mode::DirectUpload { source, key } => self.direct_upload(&source, key).await,
            Mode::PresignedUpload { source, key } => self.presigned_upload(&source, key).await,
            Mode::PresignedDownload { key, destination } => {
                self.presigned_download(&key, destination).await
            }
            Mode::Presign { method, key, ttl } => {
                let presigned = self
                    .store
                    .presign(method, &key, ttl.unwrap_or(self.presign_ttl))
                    .await?;
                Ok(Outcome::Presigned(presigned))
            }
            Mode::Stat { key } => Ok(Outcome::Metadata(self.store.stat_object(&key).await?)),
            Mode::EnsureBucket => {
                let created = self.store.ensure_bucket().await?;
                Ok(Outcome::BucketReady {
                    bucket: self.store.bucket_name().to_string(),
                    created,
                })
            }
        }
    }

    async fn direct_upload(&self, source: &Path, key: Option<String>) -> TransferResult<Outcome> {
        let file = inspect_file(source).await?;
        let key = key.unwrap_or_else(|| file.name.clone());

        self.direct_upload_payload(file, key).await
    }

    async fn direct_upload_payload(&self, file: FilePayload, key: String) -> TransferResult<Outcome> {
        self.store
            .put_object(&key, &file.content_type, file.bytes)
            .await?;

        Ok(Outcome::Uploaded {
            key,
            size: file.size,
            content_type: file.content_type,
        })
    }

    async fn presigned_upload(
        &self,
        source: &Path,
        key: Option<String>,
    ) -> TransferResult<Outcome> {
        let file = inspect_file(source).await?;
        let key = key.unwrap_or_else(|| file.name.clone());

        self.presigned_upload_payload(file, key).await
    }

    async fn presigned_upload_payload(
        &self,
        file: FilePayload,
        key: String,
    ) -> TransferResult<Outcome> {
        let constraints = PutConstraints {
            content_type: Some(file.content_type.clone()),
            content_length: Some(file.size),
        };
        let presigned = self
            .store
            .presign_put(&key, self.presign_ttl, &constraints)
            .await?;

        let status = self
            .executor
            .execute_presigned_put(&presigned, file.bytes)
            .await?;

        Ok(Outcome::PresignedUploaded {
            presigned,
            status: status.as_u16(),
        })
    }

    async fn presigned_download(
        &self,
        key: &str,
        destination: PathBuf,
    ) -> TransferResult<Outcome> {
        let presigned = self.store.presign_get(key, self.presign_ttl).await?;
        let receipt = self
            .executor
            .execute_presigned_get(&presigned, &destination)
            .await?;

        Ok(Outcome::Downloaded {
            presigned,
            destination,
            status: receipt.status.as_u16(),
            bytes_written: receipt.bytes_written,
        })
    }

    /// Replays the complete demo: ensure the bucket, upload `source` directly and
    /// through a presigned PUT, then download it again through a presigned GET
    ///
    /// `source` is read once; both uploads send that same payload.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step; later steps are not attempted
    pub async fn demo(&self, source: &Path, destination: &Path) -> TransferResult<Vec<Outcome>> {
        let file = inspect_file(source).await?;
        let key = file.name.clone();

        let mut outcomes = Vec::with_capacity(4);
        let mut record = |outcome: Outcome| {
            info!("{}", outcome);
            outcomes.push(outcome);
        };

        record(self.run(Mode::EnsureBucket).await?);
        record(self.direct_upload_payload(file.clone(), key.clone()).await?);
        record(self.presigned_upload_payload(file, key.clone()).await?);
        record(
            self.presigned_download(&key, destination.to_path_buf())
                .await?,
        );

        Ok(outcomes)
    }
}
