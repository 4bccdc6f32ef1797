// Not every helper is used in every test, so we allow dead code
#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
pub use object_transfer::test_utils::{error_body, FakeStore};
use object_transfer::{ObjectStore, StoreConfig};
use tokio::net::TcpListener;

const EMPTY_BUCKET_LIST: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
    <ListAllMyBucketsResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
    <Owner><ID>minio</ID><DisplayName>minio</DisplayName></Owner>\
    <Buckets></Buckets></ListAllMyBucketsResult>";

/// Bucket endpoints of a store that lists no buckets and answers every
/// `CreateBucket` with a fixed error
pub struct FakeBucketApi {
    pub addr: SocketAddr,
}

impl FakeBucketApi {
    pub async fn spawn(create_status: StatusCode, create_code: &'static str) -> Self {
        let router = Router::new()
            .route("/", get(list_buckets))
            .route("/{bucket}", put(create_bucket))
            .route("/{bucket}/", put(create_bucket))
            .with_state((create_status, create_code));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr }
    }

    pub async fn store(&self) -> ObjectStore {
        let config = StoreConfig {
            endpoint: self.addr.to_string(),
            ..StoreConfig::default()
        };
        ObjectStore::connect(&config).await.unwrap()
    }
}

async fn list_buckets() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/xml")], EMPTY_BUCKET_LIST)
}

async fn create_bucket(
    State((status, code)): State<(StatusCode, &'static str)>,
) -> impl IntoResponse {
    (
        status,
        [(CONTENT_TYPE, "application/xml")],
        error_body(code, "The requested bucket name is not available."),
    )
}

/// Setup test environment variables and logging
pub fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Store handle against the MinIO configured through `S3_*` variables, with a
/// bucket unique to the calling test
pub async fn minio_store() -> (ObjectStore, StoreConfig) {
    setup_test_env();

    let config = StoreConfig {
        bucket: format!("test-{}", uuid::Uuid::new_v4().simple()),
        ..StoreConfig::from_env().unwrap()
    };
    let store = ObjectStore::connect(&config).await.unwrap();
    store.ensure_bucket().await.unwrap();

    (store, config)
}
