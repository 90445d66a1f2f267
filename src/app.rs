use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    fetch::PageFetcher,
    gateway::{self, GatewayState},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    storage::ResourceFiles,
    tasks::{jobs::JobRegistry, orchestrator::BatchOrchestrator},
};

pub struct ScraperApp {
    listener: TcpListener,
    state: GatewayState,
    orchestrator: Arc<BatchOrchestrator>,
    shutdown: Shutdown,
    config: Arc<AppConfig>,
}

impl ScraperApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        // One pooled client for the whole process; every unit of every batch reuses it.
        let http_client = Client::builder()
            .user_agent(format!("price-scraper/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let fetcher = PageFetcher::new(http_client, config.fetch.clone());

        let files = ResourceFiles::new(&paths.data_dir);
        let registry = Arc::new(JobRegistry::new(config.batch.max_finished_jobs));
        let orchestrator = Arc::new(BatchOrchestrator::new(
            fetcher,
            files.clone(),
            paths.tax_table_path.clone(),
            config.batch.clone(),
            registry,
        ));

        let state = GatewayState {
            orchestrator: orchestrator.clone(),
            files,
            default_jurisdiction: Arc::from(config.batch.default_jurisdiction.as_str()),
        };

        let listener = TcpListener::bind(config.server.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;

        Ok(Self {
            listener,
            state,
            orchestrator,
            shutdown,
            config,
        })
    }

    pub async fn run(self) -> Result<()> {
        let ScraperApp {
            listener,
            state,
            orchestrator,
            shutdown,
            config,
        } = self;

        tracing::info!(
            target: "lifecycle",
            addr = %config.server.bind_addr,
            max_concurrent_fetches = config.batch.max_concurrent_fetches,
            flush_policy = ?config.batch.flush_policy,
            "price scraper listening"
        );

        axum::serve(listener, gateway::router(state))
            .with_graceful_shutdown(shutdown.subscribe().notified())
            .await
            .context("gateway server failed")?;

        tracing::info!(target: "lifecycle", "gateway stopped");
        // Batches have no cancellation, so shutdown only waits for them.
        orchestrator.drain(config.server.shutdown_grace).await;
        tracing::info!(target: "lifecycle", "price scraper stopped");
        Ok(())
    }
}
