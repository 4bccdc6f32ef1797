//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use object_transfer::{StoreConfig, DEFAULT_PRESIGN_TTL};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DEMO_OBJECT_KEY: &str = "image.png";
const DEFAULT_TEMPLATE_PATH: &str = "views/index.html";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment (uses a local `MinIO`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if `APP_ENV` contains an unknown value
    pub fn from_env() -> anyhow::Result<Self> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "development" => {
                // Check for presigned URL expiry override
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Ok(Self::Development {
                    presign_expiry_override,
                })
            }
            _ => bail!("Invalid environment: {env}"),
        }
    }

    /// Object store configuration for the environment
    ///
    /// Development falls back to the local `MinIO` defaults. Production refuses to
    /// start without an explicit endpoint and credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid
    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        if matches!(self, Self::Production) {
            for var in ["S3_ENDPOINT", "S3_ACCESS_KEY", "S3_SECRET_KEY"] {
                if env::var(var).is_err() {
                    bail!("{var} environment variable is not set");
                }
            }
        }

        let config = StoreConfig::from_env().context("Invalid object store configuration")?;
        config
            .validate()
            .context("Invalid object store configuration")?;

        Ok(config)
    }

    /// Presigned URL expiry
    #[must_use]
    pub fn presigned_url_expiry(&self) -> Duration {
        match self {
            Self::Production => DEFAULT_PRESIGN_TTL,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.map_or(DEFAULT_PRESIGN_TTL, Duration::from_secs),
        }
    }

    /// Port the demo page listens on
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number
    pub fn port(&self) -> anyhow::Result<u16> {
        env::var("PORT").map_or(Ok(DEFAULT_PORT), |p| {
            p.parse()
                .with_context(|| format!("PORT must be a port number, got {p:?}"))
        })
    }

    /// Key the demo page presigns on every request
    #[must_use]
    pub fn demo_object_key(&self) -> String {
        env::var("DEMO_OBJECT_KEY").unwrap_or_else(|_| DEFAULT_DEMO_OBJECT_KEY.to_string())
    }

    /// Template rendered by the demo page
    #[must_use]
    pub fn template_path(&self) -> PathBuf {
        env::var("DEMO_TEMPLATE_PATH")
            .map_or_else(|_| PathBuf::from(DEFAULT_TEMPLATE_PATH), PathBuf::from)
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production)
    }
}
