//! Error types for object transfer operations

use std::path::{Path, PathBuf};

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type for object transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors that can occur while talking to the store or moving bytes
#[derive(Error, Debug)]
pub enum TransferError {
    /// The store could not be reached (DNS, connection refused, timeout)
    #[error("Object store unreachable: {0}")]
    StoreUnreachable(String),

    /// Credentials were rejected by the store
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// Bucket or key does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// A presigned URL was used after its expiry
    #[error("Presigned URL expired: {0}")]
    SignatureExpired(String),

    /// Local file could not be read or written
    #[error("Local I/O error on {}: {source}", path.display())]
    LocalIo {
        /// Path the operation was acting on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The store answered a presigned transfer with a non-success status
    #[error("Transfer rejected with HTTP {status}: {message}")]
    TransferRejected {
        /// HTTP status code returned by the store
        status: u16,
        /// Error code or body returned by the store
        message: String,
    },

    /// Request signing failed
    #[error("Failed to sign request: {0}")]
    Signing(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other S3 service error
    #[error("S3 service error: {0}")]
    Store(String),
}

impl TransferError {
    /// Wraps an I/O error with the path it happened on
    pub fn local_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether a caller may reasonably retry the failed operation
    ///
    /// Only transient conditions qualify. Authentication, local I/O and
    /// configuration problems will fail the same way again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnreachable(_) | Self::TransferRejected { .. }
        )
    }

    /// Maps an SDK error from any S3 operation onto the taxonomy
    pub fn from_sdk<E>(error: SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        match &error {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                Self::StoreUnreachable(DisplayErrorContext(&error).to_string())
            }
            SdkError::ServiceError(service_err) => {
                let status = service_err.raw().status().as_u16();
                let code = service_err.err().code().unwrap_or_default();
                let message = service_err
                    .err()
                    .message()
                    .map_or_else(|| code.to_string(), |m| format!("{code}: {m}"));

                // Direct calls are signed with our own credentials, so a
                // signature or permission rejection means they are wrong
                match classify(status, code, &message) {
                    Self::Store(message) if status == 403 || code == "SignatureDoesNotMatch" => {
                        Self::AuthFailure(message)
                    }
                    other => other,
                }
            }
            _ => Self::Store(DisplayErrorContext(&error).to_string()),
        }
    }

    /// Maps a non-success HTTP response from a presigned transfer onto the taxonomy
    ///
    /// `body` is the XML error document S3-compatible stores return.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let code = xml_field(body, "Code").unwrap_or_default();
        let message = xml_field(body, "Message").map_or_else(
            || {
                if code.is_empty() {
                    body.trim().to_string()
                } else {
                    code.to_string()
                }
            },
            |m| format!("{code}: {m}"),
        );

        match classify(status, code, &message) {
            Self::Store(message) => Self::TransferRejected { status, message },
            other => other,
        }
    }
}

impl From<reqwest::Error> for TransferError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::Config(format!("Invalid transfer request: {error}"))
        } else if let Some(status) = error.status() {
            Self::TransferRejected {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            Self::StoreUnreachable(error.to_string())
        }
    }
}

fn classify(status: u16, code: &str, message: &str) -> TransferError {
    let message = message.to_string();

    if is_expired(code, &message) {
        return TransferError::SignatureExpired(message);
    }

    match code {
        "NoSuchKey" | "NoSuchBucket" | "NotFound" => TransferError::ObjectNotFound(message),
        "InvalidAccessKeyId" | "InvalidToken" | "AccessDenied" => {
            TransferError::AuthFailure(message)
        }
        _ => match status {
            404 => TransferError::ObjectNotFound(message),
            401 => TransferError::AuthFailure(message),
            _ => TransferError::Store(message),
        },
    }
}

fn is_expired(code: &str, message: &str) -> bool {
    matches!(code, "ExpiredToken" | "RequestExpired")
        || (code == "AccessDenied" && message.to_lowercase().contains("expired"))
}

fn xml_field<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;

    Some(body[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXPIRED_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Request has expired</Message><Key>a.txt</Key></Error>"#;

    const MISMATCH_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>SignatureDoesNotMatch</Code><Message>The request signature we calculated does not match the signature you provided.</Message></Error>"#;

    #[test]
    fn test_expired_response() {
        let err = TransferError::from_response(403, EXPIRED_BODY);
        assert!(matches!(err, TransferError::SignatureExpired(_)));
        assert_eq!(
            err.to_string(),
            "Presigned URL expired: AccessDenied: Request has expired"
        );
    }

    #[test]
    fn test_signature_mismatch_is_rejected_transfer() {
        let err = TransferError::from_response(403, MISMATCH_BODY);
        match err {
            TransferError::TransferRejected { status, message } => {
                assert_eq!(status, 403);
                assert!(message.starts_with("SignatureDoesNotMatch"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_response() {
        let body = "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>";
        let err = TransferError::from_response(404, body);
        assert!(matches!(err, TransferError::ObjectNotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_plain_body_without_code() {
        let err = TransferError::from_response(502, "  bad gateway \n");
        match err {
            TransferError::TransferRejected { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_retryable_split() {
        assert!(TransferError::StoreUnreachable("refused".into()).is_retryable());
        assert!(TransferError::TransferRejected {
            status: 503,
            message: "SlowDown".into()
        }
        .is_retryable());
        assert!(!TransferError::AuthFailure("bad key".into()).is_retryable());
        assert!(!TransferError::local_io(
            "missing.png",
            std::io::Error::from(std::io::ErrorKind::NotFound)
        )
        .is_retryable());
    }
}
