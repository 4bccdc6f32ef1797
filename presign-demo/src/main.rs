use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use object_transfer::{ObjectStore, TransferExecutor};
use presign_demo::{
    cli::{Cli, Command},
    routes::page::DemoPage,
    server,
    types::Environment,
    workflow::Workflow,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let environment = Environment::from_env()?;

    // JSON logs for production, human readable output everywhere else
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let store = ObjectStore::connect(&environment.store_config()?)
        .await
        .context("Failed to connect to the object store")?;
    let workflow = Workflow::new(
        store,
        TransferExecutor::new()?,
        environment.presigned_url_expiry(),
    );

    let port = match cli.command {
        Command::Serve { port } => port,
        Command::Demo {
            source,
            destination,
            port,
            no_serve,
        } => {
            for outcome in workflow.demo(&source, &destination).await? {
                println!("{outcome}");
            }
            if no_serve {
                return Ok(());
            }
            port
        }
        command => {
            if let Some(mode) = command.mode() {
                println!("{}", workflow.run(mode).await?);
            }
            return Ok(());
        }
    };

    let port = match port {
        Some(port) => port,
        None => environment.port()?,
    };
    let page = Arc::new(DemoPage::from_environment(&environment));

    server::start(port, Arc::new(workflow.store().clone()), page).await
}
