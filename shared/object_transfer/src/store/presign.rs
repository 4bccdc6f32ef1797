//! Presigned request generation

use std::time::Duration;

use aws_sdk_s3::{error::DisplayErrorContext, presigning::PresigningConfig};
use chrono::{DateTime, Utc};
use strum::{Display, EnumString};
use tracing::{debug, instrument};

use super::ObjectStore;
use crate::error::{TransferError, TransferResult};

/// Validity window used when the caller does not pick one
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);

/// HTTP method a presigned URL authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum PresignMethod {
    /// Download the object
    Get,
    /// Upload the object
    Put,
}

/// Headers a presigned PUT commits to
///
/// Whatever is set here becomes part of the signature, so the uploader must send
/// exactly these values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutConstraints {
    /// Required `Content-Type`
    pub content_type: Option<String>,
    /// Required `Content-Length`
    pub content_length: Option<u64>,
}

/// A signed, time-boxed request for one key
#[derive(Debug, Clone)]
pub struct PresignedRequest {
    /// Object key
    pub key: String,
    /// Authorized method
    pub method: PresignMethod,
    /// Fully qualified URL including signature query parameters
    pub url: String,
    /// Instant after which the store rejects the URL
    pub expires_at: DateTime<Utc>,
    /// Signed headers that must accompany the request
    pub headers: Vec<(String, String)>,
}

impl PresignedRequest {
    fn from_sdk(
        key: &str,
        method: PresignMethod,
        request: &aws_sdk_s3::presigning::PresignedRequest,
        ttl: Duration,
    ) -> Self {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());

        Self {
            key: key.to_string(),
            method,
            url: request.uri().to_string(),
            expires_at,
            headers: request
                .headers()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl ObjectStore {
    /// Presigns `method` on `key` for `ttl`
    ///
    /// Pure URL construction: no request reaches the store.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Signing` if the ttl is out of range or signing fails
    pub async fn presign(
        &self,
        method: PresignMethod,
        key: &str,
        ttl: Duration,
    ) -> TransferResult<PresignedRequest> {
        match method {
            PresignMethod::Get => self.presign_get(key, ttl).await,
            PresignMethod::Put => self.presign_put(key, ttl, &PutConstraints::default()).await,
        }
    }

    /// Presigns a download of `key`
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Signing` if the ttl is out of range or signing fails
    #[instrument(skip(self))]
    pub async fn presign_get(&self, key: &str, ttl: Duration) -> TransferResult<PresignedRequest> {
        let request = self
            .presign_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning_config(ttl)?)
            .await
            .map_err(|e| {
                TransferError::Signing(format!(
                    "Failed to presign GET for {key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let presigned = PresignedRequest::from_sdk(key, PresignMethod::Get, &request, ttl);
        debug!("Presigned GET for {} expires at {}", key, presigned.expires_at);

        Ok(presigned)
    }

    /// Presigns an upload of `key`, committing to `constraints`
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Signing` if the ttl is out of range or signing fails
    #[instrument(skip(self))]
    pub async fn presign_put(
        &self,
        key: &str,
        ttl: Duration,
        constraints: &PutConstraints,
    ) -> TransferResult<PresignedRequest> {
        let content_length = constraints
            .content_length
            .map(i64::try_from)
            .transpose()
            .map_err(|_| TransferError::Signing(format!("Content length too large for {key}")))?;

        let request = self
            .presign_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .set_content_type(constraints.content_type.clone())
            .set_content_length(content_length)
            .presigned(presigning_config(ttl)?)
            .await
            .map_err(|e| {
                TransferError::Signing(format!(
                    "Failed to presign PUT for {key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let presigned = PresignedRequest::from_sdk(key, PresignMethod::Put, &request, ttl);
        debug!("Presigned PUT for {} expires at {}", key, presigned.expires_at);

        Ok(presigned)
    }
}

fn presigning_config(ttl: Duration) -> TransferResult<PresigningConfig> {
    PresigningConfig::expires_in(ttl)
        .map_err(|e| TransferError::Signing(format!("Invalid presign expiry {ttl:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use pretty_assertions::assert_eq;

    async fn offline_store(config: &StoreConfig) -> ObjectStore {
        ObjectStore::connect(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_presign_get_url_shape() {
        let store = offline_store(&StoreConfig::default()).await;

        let presigned = store
            .presign_get("a.txt", DEFAULT_PRESIGN_TTL)
            .await
            .unwrap();

        assert_eq!(presigned.method, PresignMethod::Get);
        assert_eq!(presigned.key, "a.txt");
        assert!(presigned.url.starts_with("http://localhost:9000/bucket/a.txt?"));
        assert!(presigned.url.contains("X-Amz-Expires=900"));
        assert!(presigned.url.contains("X-Amz-Signature="));
        assert!(presigned.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_presign_uses_public_endpoint() {
        let config = StoreConfig {
            endpoint: "minio:9000".to_string(),
            public_endpoint: Some("files.example.com:9000".to_string()),
            ..StoreConfig::default()
        };
        let store = offline_store(&config).await;

        let presigned = store
            .presign(PresignMethod::Get, "image.png", DEFAULT_PRESIGN_TTL)
            .await
            .unwrap();

        assert!(presigned
            .url
            .starts_with("http://files.example.com:9000/bucket/image.png?"));
        assert!(!presigned.url.contains("minio:9000"));
    }

    #[tokio::test]
    async fn test_presign_put_signs_content_length() {
        let store = offline_store(&StoreConfig::default()).await;
        let constraints = PutConstraints {
            content_type: Some("text/plain; charset=utf-8".to_string()),
            content_length: Some(10),
        };

        let presigned = store
            .presign_put("a.txt", DEFAULT_PRESIGN_TTL, &constraints)
            .await
            .unwrap();

        assert_eq!(presigned.method, PresignMethod::Put);
        assert!(presigned.url.starts_with("http://localhost:9000/bucket/a.txt?"));
        // Signed header list is part of the query string
        assert!(presigned.url.contains("content-length"));
    }

    #[tokio::test]
    async fn test_presign_rejects_excessive_ttl() {
        let store = offline_store(&StoreConfig::default()).await;

        // SigV4 caps presigned URLs at seven days
        let err = store
            .presign_get("a.txt", Duration::from_secs(8 * 24 * 60 * 60))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Signing(_)));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<PresignMethod>().unwrap(), PresignMethod::Get);
        assert_eq!("PUT".parse::<PresignMethod>().unwrap(), PresignMethod::Put);
        assert!("delete".parse::<PresignMethod>().is_err());
        assert_eq!(PresignMethod::Put.to_string(), "PUT");
    }
}
