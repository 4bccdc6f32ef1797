//! S3-compatible object store client
//!
//! Wraps two SDK clients built from one [`StoreConfig`]: one bound to the
//! internal endpoint for direct operations and one bound to the externally
//! reachable endpoint for presigning. When no public endpoint is configured both
//! point at the same host.

mod presign;

use std::sync::Arc;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::{
    config::Credentials, error::SdkError, operation::create_bucket::CreateBucketError,
    primitives::ByteStream, Client as S3Client,
};
use tracing::{debug, info, instrument, warn};

pub use presign::{PresignMethod, PresignedRequest, PutConstraints, DEFAULT_PRESIGN_TTL};

use crate::config::StoreConfig;
use crate::error::{TransferError, TransferResult};

const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const CREDENTIALS_PROVIDER: &str = "object-transfer-static";

/// Metadata returned by a `HeadObject` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Stored content type, if any
    pub content_type: Option<String>,
    /// Entity tag, if any
    pub etag: Option<String>,
}

/// Handle to one bucket of an S3-compatible store
#[derive(Clone)]
pub struct ObjectStore {
    s3_client: Arc<S3Client>,
    presign_client: Arc<S3Client>,
    bucket_name: String,
}

impl ObjectStore {
    /// Creates a store handle from pre-configured clients
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Client bound to the internal endpoint
    /// * `presign_client` - Client bound to the endpoint presigned URLs should carry
    /// * `bucket_name` - Bucket every operation targets
    #[must_use]
    pub const fn new(
        s3_client: Arc<S3Client>,
        presign_client: Arc<S3Client>,
        bucket_name: String,
    ) -> Self {
        Self {
            s3_client,
            presign_client,
            bucket_name,
        }
    }

    /// Builds both clients from configuration
    ///
    /// No request is sent; the SDK connects lazily on the first operation.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Config` if the configuration is incomplete or an
    /// endpoint is malformed
    pub async fn connect(config: &StoreConfig) -> TransferResult<Self> {
        config.validate()?;
        let endpoint_url = config.endpoint_url()?;

        let s3_client = Arc::new(S3Client::from_conf(
            Self::client_config(config, &endpoint_url).await,
        ));

        let presign_client = if config.public_endpoint.is_some() {
            let public_endpoint_url = config.presign_endpoint_url()?;
            info!(
                s3_public_endpoint = %public_endpoint_url,
                "Signing presigned URLs against public endpoint"
            );
            Arc::new(S3Client::from_conf(
                Self::client_config(config, &public_endpoint_url).await,
            ))
        } else {
            s3_client.clone()
        };

        info!(
            endpoint = %endpoint_url,
            bucket = %config.bucket,
            path_style = config.path_style,
            "Initialized object store client"
        );

        Ok(Self::new(s3_client, presign_client, config.bucket.clone()))
    }

    async fn client_config(config: &StoreConfig, endpoint_url: &str) -> aws_sdk_s3::Config {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        // Transfers are attempted exactly once; callers decide about retries
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeout_config)
            .load()
            .await;

        let s3_config: aws_sdk_s3::Config = (&sdk_config).into();
        let mut builder = s3_config.to_builder();
        builder.set_force_path_style(Some(config.path_style));

        builder.build()
    }

    /// Name of the bucket this handle targets
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Makes sure the configured bucket exists
    ///
    /// # Errors
    ///
    /// See [`Self::ensure_named_bucket`]
    pub async fn ensure_bucket(&self) -> TransferResult<bool> {
        self.ensure_named_bucket(&self.bucket_name).await
    }

    /// Lists all buckets and creates `name` if it is missing
    ///
    /// Returns `true` when this call created the bucket. A concurrent creator
    /// winning the race is not an error.
    ///
    /// # Errors
    ///
    /// Returns the classified SDK error if listing or creating fails for any
    /// other reason
    #[instrument(skip(self))]
    pub async fn ensure_named_bucket(&self, name: &str) -> TransferResult<bool> {
        let buckets = self
            .s3_client
            .list_buckets()
            .send()
            .await
            .map_err(TransferError::from_sdk)?;

        let exists = buckets
            .buckets()
            .iter()
            .any(|bucket| bucket.name() == Some(name));

        if exists {
            debug!("Bucket already exists: {}", name);
            return Ok(false);
        }

        match self.s3_client.create_bucket().bucket(name).send().await {
            Ok(_) => {
                info!("Created bucket: {}", name);
                Ok(true)
            }
            Err(SdkError::ServiceError(service_err))
                if matches!(
                    service_err.err(),
                    CreateBucketError::BucketAlreadyOwnedByYou(_)
                        | CreateBucketError::BucketAlreadyExists(_)
                ) =>
            {
                warn!("Bucket {} was created concurrently, continuing", name);
                Ok(false)
            }
            Err(e) => Err(TransferError::from_sdk(e)),
        }
    }

    /// Uploads `bytes` under `key` in a single `PutObject` call
    ///
    /// # Errors
    ///
    /// Returns the classified SDK error if the store rejects the write or cannot
    /// be reached
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> TransferResult<Option<String>> {
        let content_length = i64::try_from(bytes.len())
            .map_err(|_| TransferError::Config(format!("{key} is too large to upload")))?;

        let output = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(TransferError::from_sdk)?;

        info!("Uploaded object: {}", key);

        Ok(output.e_tag().map(ToString::to_string))
    }

    /// Fetches size, content type and entity tag of `key`
    ///
    /// # Errors
    ///
    /// Returns `TransferError::ObjectNotFound` if the key does not exist, or the
    /// classified SDK error otherwise
    #[instrument(skip(self))]
    pub async fn stat_object(&self, key: &str) -> TransferResult<ObjectMetadata> {
        let output = self
            .s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(TransferError::from_sdk)?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: output
                .content_length()
                .and_then(|len| u64::try_from(len).ok())
                .unwrap_or_default(),
            content_type: output.content_type().map(ToString::to_string),
            etag: output.e_tag().map(ToString::to_string),
        })
    }
}
