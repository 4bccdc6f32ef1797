//! Error handling for the demo page

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use object_transfer::TransferError;
use thiserror::Error;

/// Failures while rendering the demo page
///
/// Every variant is answered with a 500 carrying the error text, so the page
/// shows exactly what went wrong during signing or template loading.
#[derive(Debug, Error)]
pub enum PageError {
    /// The template file could not be read
    #[error("failed to load template {}: {source}", path.display())]
    Template {
        /// Template location
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The presigned URL could not be generated
    #[error(transparent)]
    Presign(#[from] TransferError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("Server error: {self}");

        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
