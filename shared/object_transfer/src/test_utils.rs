//! In-process stand-in for an S3-compatible store
//!
//! Accepts any signature on plain `GET` and `PUT` of `/{bucket}/{key}`, which is
//! all a presigned transfer sends, and keeps just enough bucket state to answer
//! `ListBuckets` and `CreateBucket`. Enabled with the `test-utils` feature.

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use tokio::net::TcpListener;

use crate::config::StoreConfig;

/// Key the fake answers like a store rejecting an expired signature
pub const EXPIRED_KEY: &str = "expired.bin";

type Objects = Arc<Mutex<HashMap<String, (String, Vec<u8>)>>>;
type Buckets = Arc<Mutex<BTreeSet<String>>>;

#[derive(Clone, Default)]
struct FakeState {
    objects: Objects,
    buckets: Buckets,
}

/// Handle to a running fake store
pub struct FakeStore {
    /// Address the fake listens on
    pub addr: SocketAddr,
    objects: Objects,
    buckets: Buckets,
}

impl FakeStore {
    /// Binds an ephemeral local port and serves until the runtime shuts down
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound
    pub async fn spawn() -> std::io::Result<Self> {
        let state = FakeState::default();

        let router = Router::new()
            .route("/", get(list_buckets))
            .route("/{bucket}", put(create_bucket))
            .route("/{bucket}/", put(create_bucket))
            .route("/{bucket}/{key}", get(get_object).put(put_object))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Fake store stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            objects: state.objects,
            buckets: state.buckets,
        })
    }

    /// Store configuration whose clients and presigned URLs point at this fake
    #[must_use]
    pub fn config(&self) -> StoreConfig {
        StoreConfig {
            endpoint: self.addr.to_string(),
            ..StoreConfig::default()
        }
    }

    /// URL of `key` carrying a dummy signature
    #[must_use]
    pub fn url(&self, bucket: &str, key: &str) -> String {
        format!("http://{}/{bucket}/{key}?X-Amz-Signature=fake", self.addr)
    }

    /// URL the fake rejects as expired
    #[must_use]
    pub fn expired_url(&self, bucket: &str) -> String {
        self.url(bucket, EXPIRED_KEY)
    }

    /// Content type and body stored under `key`
    #[must_use]
    pub fn stored(&self, bucket: &str, key: &str) -> Option<(String, Vec<u8>)> {
        lock(&self.objects).get(&object_id(bucket, key)).cloned()
    }

    /// Whether `bucket` has been created
    #[must_use]
    pub fn has_bucket(&self, bucket: &str) -> bool {
        lock(&self.buckets).contains(bucket)
    }

    /// Seeds an object
    pub fn insert(&self, bucket: &str, key: &str, content_type: &str, bytes: &[u8]) {
        lock(&self.objects).insert(
            object_id(bucket, key),
            (content_type.to_string(), bytes.to_vec()),
        );
    }
}

fn lock<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn object_id(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

/// S3 error document
#[must_use]
pub fn error_body(code: &str, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>{code}</Code><Message>{message}</Message></Error>"
    )
}

fn xml_response(status: StatusCode, body: String) -> Response {
    (status, [(CONTENT_TYPE, "application/xml")], body).into_response()
}

async fn list_buckets(State(state): State<FakeState>) -> Response {
    let buckets: String = lock(&state.buckets)
        .iter()
        .map(|name| {
            format!("<Bucket><Name>{name}</Name><CreationDate>2024-01-01T00:00:00.000Z</CreationDate></Bucket>")
        })
        .collect();

    xml_response(
        StatusCode::OK,
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <ListAllMyBucketsResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Owner><ID>fake</ID><DisplayName>fake</DisplayName></Owner>\
             <Buckets>{buckets}</Buckets></ListAllMyBucketsResult>"
        ),
    )
}

async fn create_bucket(State(state): State<FakeState>, Path(bucket): Path<String>) -> Response {
    if lock(&state.buckets).insert(bucket) {
        StatusCode::OK.into_response()
    } else {
        xml_response(
            StatusCode::CONFLICT,
            error_body(
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already own it.",
            ),
        )
    }
}

async fn get_object(
    State(FakeState { objects, .. }): State<FakeState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Response {
    if key == EXPIRED_KEY {
        return xml_response(
            StatusCode::FORBIDDEN,
            error_body("AccessDenied", "Request has expired"),
        );
    }

    match lock(&objects).get(&object_id(&bucket, &key)) {
        Some((content_type, bytes)) => (
            StatusCode::OK,
            [(CONTENT_TYPE, content_type.clone())],
            bytes.clone(),
        )
            .into_response(),
        None => xml_response(
            StatusCode::NOT_FOUND,
            error_body("NoSuchKey", "The specified key does not exist."),
        ),
    }
}

async fn put_object(
    State(FakeState { objects, .. }): State<FakeState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if key == EXPIRED_KEY {
        return xml_response(
            StatusCode::FORBIDDEN,
            error_body("AccessDenied", "Request has expired"),
        );
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    lock(&objects).insert(object_id(&bucket, &key), (content_type, body.to_vec()));

    StatusCode::OK.into_response()
}
