use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router};
use object_transfer::ObjectStore;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::routes::{self, page::DemoPage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the application router with its shared dependencies attached
pub fn router(store: Arc<ObjectStore>, page: Arc<DemoPage>) -> Router {
    routes::handler()
        .layer(Extension(store))
        .layer(Extension(page))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Starts the server on `port` with the given dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(port: u16, store: Arc<ObjectStore>, page: Arc<DemoPage>) -> anyhow::Result<()> {
    let router = router(store, page);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Demo page started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server");
}
