use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, response::Response, Router};
use object_transfer::{ObjectStore, StoreConfig, TransferExecutor};
use presign_demo::{routes::page::DemoPage, server, workflow::Workflow};
use tower::ServiceExt;

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Store handle for `config`; signing never touches the network
pub async fn store_for(config: &StoreConfig) -> ObjectStore {
    ObjectStore::connect(config).await.unwrap()
}

/// Workflow over `config` with a short presign expiry
pub async fn workflow_for(config: &StoreConfig) -> Workflow {
    Workflow::new(
        store_for(config).await,
        TransferExecutor::new().unwrap(),
        Duration::from_secs(60),
    )
}

/// Router wired like the real server, with a template from `dir`
pub struct TestSetup {
    pub router: Router,
    pub config: StoreConfig,
    pub page: Arc<DemoPage>,
    _dir: tempfile::TempDir,
}

impl TestSetup {
    pub async fn new(template: Option<&str>) -> Self {
        setup_test_env();

        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("index.html");
        if let Some(template) = template {
            std::fs::write(&template_path, template).unwrap();
        }

        Self::with_template_path(template_path, dir).await
    }

    async fn with_template_path(template_path: PathBuf, dir: tempfile::TempDir) -> Self {
        let config = StoreConfig::default();
        let store = Arc::new(store_for(&config).await);
        let page = Arc::new(DemoPage {
            template_path,
            object_key: "image.png".to_string(),
            ttl: Duration::from_secs(900),
        });

        let router = server::router(store, page.clone());

        Self {
            router,
            config,
            page,
            _dir: dir,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.page.template_path
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
