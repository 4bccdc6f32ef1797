//! Connection settings for an S3-compatible store

use std::env;

use url::Url;

use crate::error::{TransferError, TransferResult};

const DEFAULT_ENDPOINT: &str = "http://localhost:9000";
const DEFAULT_ACCESS_KEY: &str = "minioadmin";
const DEFAULT_SECRET_KEY: &str = "minioadmin";
const DEFAULT_REGION: &str = "ap-northeast-1";
const DEFAULT_BUCKET: &str = "bucket";

/// Store connection configuration
///
/// `endpoint` is used for every direct call (list, create, put, head).
/// `public_endpoint`, when set, is the host presigned URLs are signed against, so
/// callers outside the store's network receive a URL they can reach.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Endpoint the SDK talks to, e.g. `localhost:9000` or `http://minio:9000`
    pub endpoint: String,
    /// Externally reachable endpoint used for presigning
    pub public_endpoint: Option<String>,
    /// Static access key
    pub access_key: String,
    /// Static secret key
    pub secret_key: String,
    /// Signing region
    pub region: String,
    /// Target bucket
    pub bucket: String,
    /// Encode the bucket as a path segment instead of a subdomain
    pub path_style: bool,
    /// Use `https` for the endpoints
    pub tls_enabled: bool,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("public_endpoint", &self.public_endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("path_style", &self.path_style)
            .field("tls_enabled", &self.tls_enabled)
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            public_endpoint: None,
            access_key: DEFAULT_ACCESS_KEY.to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            region: DEFAULT_REGION.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            path_style: true,
            tls_enabled: false,
        }
    }
}

impl StoreConfig {
    /// Reads the configuration from `S3_*` environment variables, falling back to
    /// the local MinIO defaults for anything unset
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Config` if a boolean flag holds an unparseable value
    pub fn from_env() -> TransferResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").unwrap_or(defaults.endpoint),
            public_endpoint: env::var("S3_PUBLIC_ENDPOINT")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            access_key: env::var("S3_ACCESS_KEY").unwrap_or(defaults.access_key),
            secret_key: env::var("S3_SECRET_KEY").unwrap_or(defaults.secret_key),
            region: env::var("S3_REGION").unwrap_or(defaults.region),
            bucket: env::var("S3_BUCKET_NAME").unwrap_or(defaults.bucket),
            path_style: bool_var("S3_FORCE_PATH_STYLE", defaults.path_style)?,
            tls_enabled: bool_var("S3_TLS_ENABLED", defaults.tls_enabled)?,
        })
    }

    /// Checks that the fields needed to build a client are present and that both
    /// endpoints parse
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Config` naming the first empty or malformed field
    pub fn validate(&self) -> TransferResult<()> {
        let required = [
            ("endpoint", &self.endpoint),
            ("access_key", &self.access_key),
            ("secret_key", &self.secret_key),
            ("region", &self.region),
            ("bucket", &self.bucket),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(TransferError::Config(format!("{name} must not be empty")));
            }
        }

        self.endpoint_url()?;
        self.presign_endpoint_url()?;

        Ok(())
    }

    /// Endpoint URL for direct store calls
    ///
    /// # Errors
    ///
    /// See [`Self::presign_endpoint_url`]
    pub fn endpoint_url(&self) -> TransferResult<String> {
        self.normalize("endpoint", &self.endpoint)
    }

    /// Endpoint URL that presigned URLs are signed against
    ///
    /// A scheme-less endpoint gets `https` or `http` according to `tls_enabled`.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Config` if the endpoint is not a valid URL or its
    /// explicit scheme contradicts `tls_enabled`
    pub fn presign_endpoint_url(&self) -> TransferResult<String> {
        match &self.public_endpoint {
            Some(public_endpoint) => self.normalize("public_endpoint", public_endpoint),
            None => self.endpoint_url(),
        }
    }

    fn normalize(&self, name: &str, endpoint: &str) -> TransferResult<String> {
        let scheme = if self.tls_enabled { "https" } else { "http" };
        let endpoint = endpoint.trim();

        let url = if endpoint.contains("://") {
            Url::parse(endpoint)
        } else {
            Url::parse(&format!("{scheme}://{endpoint}"))
        }
        .map_err(|e| TransferError::Config(format!("{name} {endpoint:?} is not a valid URL: {e}")))?;

        if url.scheme() != scheme {
            return Err(TransferError::Config(format!(
                "{name} {endpoint:?} uses {}, but tls_enabled={} requires {scheme}",
                url.scheme(),
                self.tls_enabled
            )));
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

fn bool_var(name: &str, default: bool) -> TransferResult<bool> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(TransferError::Config(format!(
                "{name} must be a boolean, got {other:?}"
            ))),
        },
    }
}
