//! Bucket and object tests
//!
//! The `#[ignore]`d tests need a MinIO listening on `S3_ENDPOINT` (default
//! `http://localhost:9000`): `cargo test -p object_transfer -- --ignored`

mod common;

use std::time::Duration;

use common::*;

use http::StatusCode;
use object_transfer::{
    inspect_file, PresignMethod, PutConstraints, TransferError, TransferExecutor,
    DEFAULT_PRESIGN_TTL,
};

#[tokio::test]
async fn test_ensure_bucket_tolerates_bucket_owned_by_us() {
    let api = FakeBucketApi::spawn(StatusCode::CONFLICT, "BucketAlreadyOwnedByYou").await;
    let store = api.store().await;

    // Listed as missing, then lost the creation race
    assert!(!store.ensure_bucket().await.unwrap());
}

#[tokio::test]
async fn test_ensure_bucket_tolerates_bucket_created_elsewhere() {
    let api = FakeBucketApi::spawn(StatusCode::CONFLICT, "BucketAlreadyExists").await;
    let store = api.store().await;

    assert!(!store.ensure_named_bucket("uploads").await.unwrap());
}

#[tokio::test]
async fn test_ensure_bucket_denied_is_auth_failure() {
    let api = FakeBucketApi::spawn(StatusCode::FORBIDDEN, "AccessDenied").await;
    let store = api.store().await;

    let err = store.ensure_bucket().await.unwrap_err();
    assert!(matches!(err, TransferError::AuthFailure(_)), "{err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_ensure_bucket_is_idempotent() {
    let (store, _config) = minio_store().await;

    // `minio_store` already created the bucket
    assert!(!store.ensure_bucket().await.unwrap());
    assert!(!store.ensure_bucket().await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_ensure_bucket_creates_missing_bucket() {
    let (store, _config) = minio_store().await;
    let name = format!("test-{}", uuid::Uuid::new_v4().simple());

    assert!(store.ensure_named_bucket(&name).await.unwrap());
    assert!(!store.ensure_named_bucket(&name).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_direct_upload_then_presigned_download_round_trip() {
    let (store, _config) = minio_store().await;
    let executor = TransferExecutor::new().unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();

    store
        .put_object("blob.bin", "application/octet-stream", payload.clone())
        .await
        .unwrap();

    let metadata = store.stat_object("blob.bin").await.unwrap();
    assert_eq!(metadata.size, payload.len() as u64);
    assert_eq!(
        metadata.content_type.as_deref(),
        Some("application/octet-stream")
    );

    let presigned = store
        .presign_get("blob.bin", DEFAULT_PRESIGN_TTL)
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("blob.bin");

    executor
        .execute_presigned_get(&presigned, &destination)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&destination).unwrap(), payload);
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_text_file_scenario() {
    let (store, config) = minio_store().await;
    let executor = TransferExecutor::new().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("a.txt");
    std::fs::write(&source, b"hello1234\n").unwrap();

    let file = inspect_file(&source).await.unwrap();
    assert_eq!(file.size, 10);
    assert_eq!(file.content_type, "text/plain; charset=utf-8");

    store
        .put_object(&file.name, &file.content_type, file.bytes.clone())
        .await
        .unwrap();

    let presigned = store
        .presign(PresignMethod::Get, "a.txt", DEFAULT_PRESIGN_TTL)
        .await
        .unwrap();

    let url = url::Url::parse(&presigned.url).unwrap();
    assert_eq!(url.path(), format!("/{}/a.txt", config.bucket));
    assert!(url.query_pairs().any(|(name, _)| name == "X-Amz-Signature"));

    let destination = dir.path().join("out.txt");
    let receipt = executor
        .execute_get(&presigned.url, &destination)
        .await
        .unwrap();

    assert_eq!(receipt.status, StatusCode::OK);
    assert_eq!(std::fs::read(&destination).unwrap(), file.bytes);
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_presigned_upload_round_trip() {
    let (store, _config) = minio_store().await;
    let executor = TransferExecutor::new().unwrap();
    let body = b"presigned body".to_vec();

    let constraints = PutConstraints {
        content_type: Some("text/plain; charset=utf-8".to_string()),
        content_length: Some(body.len() as u64),
    };
    let presigned = store
        .presign_put("upload.txt", DEFAULT_PRESIGN_TTL, &constraints)
        .await
        .unwrap();

    let status = executor
        .execute_presigned_put(&presigned, body.clone())
        .await
        .unwrap();
    assert!(status.is_success());

    let metadata = store.stat_object("upload.txt").await.unwrap();
    assert_eq!(metadata.size, body.len() as u64);
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_presigned_get_expires() {
    let (store, _config) = minio_store().await;
    let executor = TransferExecutor::new().unwrap();

    store
        .put_object("short.txt", "text/plain", b"short lived".to_vec())
        .await
        .unwrap();

    let presigned = store
        .presign_get("short.txt", Duration::from_secs(1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;

    let dir = tempfile::tempdir().unwrap();
    let err = executor
        .execute_get(&presigned.url, dir.path().join("short.txt"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::SignatureExpired(_)), "{err:?}");
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_presigned_put_rejects_tampered_length() {
    let (store, _config) = minio_store().await;
    let executor = TransferExecutor::new().unwrap();

    let constraints = PutConstraints {
        content_type: Some("text/plain; charset=utf-8".to_string()),
        content_length: Some(10),
    };
    let presigned = store
        .presign_put("tampered.txt", DEFAULT_PRESIGN_TTL, &constraints)
        .await
        .unwrap();

    let err = executor
        .execute_presigned_put(&presigned, b"this body is longer than signed".to_vec())
        .await
        .unwrap_err();

    assert!(
        matches!(err, TransferError::TransferRejected { status, .. } if status == 403),
        "{err:?}"
    );
    assert!(matches!(
        store.stat_object("tampered.txt").await.unwrap_err(),
        TransferError::ObjectNotFound(_)
    ));
}

#[tokio::test]
#[ignore = "requires a running MinIO"]
async fn test_wrong_credentials_are_auth_failure() {
    let (_store, config) = minio_store().await;
    let config = object_transfer::StoreConfig {
        secret_key: "not-the-secret".to_string(),
        ..config
    };
    let store = object_transfer::ObjectStore::connect(&config).await.unwrap();

    let err = store.ensure_bucket().await.unwrap_err();
    assert!(matches!(err, TransferError::AuthFailure(_)), "{err:?}");
    assert!(!err.is_retryable());
}
