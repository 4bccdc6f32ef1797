//! Command line interface

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use object_transfer::PresignMethod;

use crate::workflow::Mode;

/// Direct and presigned object transfers against an S3-compatible store
#[derive(Debug, Parser)]
#[command(name = "presign-demo", version, about)]
pub struct Cli {
    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a file through the SDK
    Upload {
        /// File to upload
        file: PathBuf,
        /// Object key (defaults to the file name)
        #[arg(long)]
        key: Option<String>,
    },
    /// Upload a file through a presigned PUT URL
    PresignedUpload {
        /// File to upload
        file: PathBuf,
        /// Object key (defaults to the file name)
        #[arg(long)]
        key: Option<String>,
    },
    /// Download an object through a presigned GET URL
    Download {
        /// Object key
        key: String,
        /// Destination file, overwritten if present
        destination: PathBuf,
    },
    /// Print a presigned URL without using it
    Presign {
        /// GET or PUT
        method: PresignMethod,
        /// Object key
        key: String,
        /// Validity in seconds (defaults to the configured expiry)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Show an object's size, content type and etag
    Stat {
        /// Object key
        key: String,
    },
    /// Create the configured bucket if it does not exist
    EnsureBucket,
    /// Serve the demo page
    Serve {
        /// Port to listen on (defaults to 8080)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Run the whole demo: upload, presigned upload, presigned download, then serve
    Demo {
        /// File to upload
        #[arg(long, env = "DEMO_SOURCE_PATH", default_value = "images/image.png")]
        source: PathBuf,
        /// Where the downloaded copy goes
        #[arg(long, env = "DEMO_DOWNLOAD_PATH", default_value = "images/downloaded.png")]
        destination: PathBuf,
        /// Port to listen on (defaults to 8080)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
        /// Exit after the transfers instead of serving the page
        #[arg(long)]
        no_serve: bool,
    },
}

impl Command {
    /// Workflow mode for commands that are a single run, `None` for the rest
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Self::Upload { file, key } => Some(Mode::DirectUpload {
                source: file.clone(),
                key: key.clone(),
            }),
            Self::PresignedUpload { file, key } => Some(Mode::PresignedUpload {
                source: file.clone(),
                key: key.clone(),
            }),
            Self::Download { key, destination } => Some(Mode::PresignedDownload {
                key: key.clone(),
                destination: destination.clone(),
            }),
            Self::Presign {
                method,
                key,
                ttl_secs,
            } => Some(Mode::Presign {
                method: *method,
                key: key.clone(),
                ttl: ttl_secs.map(Duration::from_secs),
            }),
            Self::Stat { key } => Some(Mode::Stat { key: key.clone() }),
            Self::EnsureBucket => Some(Mode::EnsureBucket),
            Self::Serve { .. } | Self::Demo { .. } => None,
        }
    }
}
