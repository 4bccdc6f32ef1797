mod health;
/// Demo page rendering
pub mod page;

use axum::{routing::get, Router};

/// Creates the router with all handler routes
///
/// Handlers expect `Arc<ObjectStore>` and `Arc<DemoPage>` as extensions.
pub fn handler() -> Router {
    Router::new()
        .route("/", get(page::handler))
        .route("/health", get(health::handler))
}
