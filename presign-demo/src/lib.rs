//! Presigned transfer demo: command line workflows and a page that links to a
//! freshly presigned download URL

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Command line interface
pub mod cli;

/// Route handlers
pub mod routes;

/// HTTP server setup
pub mod server;

/// Environment and error types
pub mod types;

/// Upload and download workflows
pub mod workflow;
