//! Object transfer primitives for S3-compatible stores
//!
//! This crate provides the pieces of the presigned-transfer workflow shared by the
//! demo binary and its web page: reading and sniffing local files, talking to the
//! store through the AWS SDK, generating presigned URLs and executing them over
//! plain HTTP.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

pub mod config;
pub mod error;
pub mod file_inspector;
pub mod sniff;
pub mod store;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod transfer;

pub use config::StoreConfig;
pub use error::{TransferError, TransferResult};
pub use file_inspector::{inspect_file, FilePayload};
pub use store::{
    ObjectMetadata, ObjectStore, PresignMethod, PresignedRequest, PutConstraints,
    DEFAULT_PRESIGN_TTL,
};
pub use transfer::{DownloadReceipt, TransferExecutor};
