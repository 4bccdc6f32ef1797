use axum::Json;
use serde::Serialize;

/// Liveness report of the demo server
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers
    status: &'static str,
    /// Crate version the binary was built from
    semver: &'static str,
    /// Commit hash, when `GIT_REV` was set at build time
    rev: Option<&'static str>,
}

/// Reports that the server is up
///
/// Does not contact the object store; a reachable store is checked by the
/// first transfer, not here.
pub async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        semver: env!("CARGO_PKG_VERSION"),
        rev: option_env!("GIT_REV"),
    })
}
