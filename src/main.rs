mod app;
mod config;
mod domain;
mod extract;
mod fetch;
mod gateway;
mod infrastructure;
mod pricing;
mod storage;
mod tasks;
mod tax;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config.logging, &paths)?;
    if paths.tax_table_missing() {
        tracing::warn!(
            target: "lifecycle",
            path = %paths.tax_table_path.display(),
            "tax reference table not found; batches will fail until it exists"
        );
    }

    let shutdown = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::ScraperApp::initialize(config, paths, shutdown).await?;
    app.run().await
}
