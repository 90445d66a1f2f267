use std::{collections::HashSet, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use futures::{StreamExt, stream};
use parking_lot::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

use crate::{
    config::{BatchConfig, FlushPolicy},
    domain::{BatchJob, BatchState, ScrapedItem, UnitFailure, UnitKey, UnitOutcome},
    extract,
    fetch::PageFetcher,
    storage::ResourceFiles,
    tasks::{jobs::JobRegistry, writer::RecordWriter},
    tax::TaxTable,
};

/// Runs batches: resolve the tax rate, fan out one unit per unique URL,
/// wait for every unit, flush the results.
pub struct BatchOrchestrator {
    fetcher: PageFetcher,
    files: ResourceFiles,
    tax_table_path: PathBuf,
    config: BatchConfig,
    registry: Arc<JobRegistry>,
    // One supervisor per submitted batch; finished ones are reaped on submit.
    batches: Mutex<JoinSet<()>>,
}

impl BatchOrchestrator {
    pub fn new(
        fetcher: PageFetcher,
        files: ResourceFiles,
        tax_table_path: PathBuf,
        config: BatchConfig,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            fetcher,
            files,
            tax_table_path,
            config,
            registry,
            batches: Mutex::new(JoinSet::new()),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Registers the job and runs it in the background. The returned id can be
    /// polled through the registry.
    pub fn submit(self: &Arc<Self>, job: BatchJob) -> Uuid {
        let id = self.registry.register(job.clone());
        tracing::info!(
            target: "batch",
            job_id = %id,
            input = %job.input_file,
            output = %job.output_file,
            jurisdiction = %job.jurisdiction,
            in_flight = self.registry.running(),
            "batch submitted"
        );
        let this = self.clone();
        let batch = tokio::spawn(async move { this.run(id, job).await });

        let mut batches = self.batches.lock();
        while batches.try_join_next().is_some() {}
        batches.spawn(supervise(self.registry.clone(), id, batch));
        id
    }

    /// Waits for every submitted batch, giving up after `grace`. Returns how
    /// many batches were still running when it gave up.
    pub async fn drain(&self, grace: Duration) -> usize {
        let mut batches = std::mem::take(&mut *self.batches.lock());
        let all_joined = async {
            while batches.join_next().await.is_some() {}
        };
        let joined = tokio::time::timeout(grace, all_joined).await;
        match joined {
            Ok(()) => 0,
            Err(_) => {
                let left = batches.len();
                tracing::warn!(
                    target: "batch",
                    running = left,
                    "batches still running after {:?}; abandoning them",
                    grace
                );
                left
            }
        }
    }

    pub async fn run(&self, id: Uuid, job: BatchJob) {
        let result = self.execute(id, &job).await;
        self.registry.update(id, |status| {
            status.state = BatchState::Done;
            status.finished_at = Some(Utc::now());
            if let Err(err) = &result {
                status.error = Some(format!("{err:#}"));
            }
        });

        match result {
            Ok(()) => {
                if let Some(status) = self.registry.get(id) {
                    tracing::info!(
                        target: "batch",
                        job_id = %id,
                        total = status.total_units,
                        succeeded = status.succeeded,
                        failed = status.failed,
                        "batch finished"
                    );
                }
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::error!(target: "batch", job_id = %id, error = %message, "batch aborted");
            }
        }
    }

    async fn execute(&self, id: Uuid, job: &BatchJob) -> Result<()> {
        let table = TaxTable::load(&self.tax_table_path).await?;
        if table.is_empty() {
            tracing::warn!(target: "batch", job_id = %id, "tax table has no usable entries");
        }
        let tax_rate = table.rate_for(&job.jurisdiction);
        self.registry.update(id, |status| {
            status.state = BatchState::TaxResolved;
            status.tax_rate = Some(tax_rate);
        });
        tracing::debug!(
            target: "batch",
            job_id = %id,
            entries = table.len(),
            tax_rate,
            "tax rate resolved"
        );

        let input_path = self.files.input_path(&job.input_file)?;
        let raw = tokio::fs::read_to_string(&input_path)
            .await
            .with_context(|| format!("failed to read input file {}", input_path.display()))?;
        let urls = unique_urls(&raw);

        let writer = RecordWriter::new(self.files.output_path(&job.output_file)?);
        self.registry.update(id, |status| {
            status.state = BatchState::FetchingAll;
            status.total_units = urls.len();
        });
        tracing::info!(target: "batch", job_id = %id, units = urls.len(), "fetching");

        let writer_ref = &writer;
        stream::iter(urls.into_iter().enumerate())
            .map(|(index, url)| async move {
                let key = UnitKey(index as u64 + 1);
                let outcome = self.run_unit(key, url, tax_rate, writer_ref).await;
                self.registry.record_outcome(id, &outcome);
            })
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect::<Vec<()>>()
            .await;

        // Every unit failing still leaves an (empty) output file behind.
        let needs_flush = match self.config.flush_policy {
            FlushPolicy::BatchEnd => true,
            FlushPolicy::EachUnit => writer.flush_count() == 0,
        };
        if needs_flush {
            writer.flush().await?;
        }
        let output_writes = writer.flush_count();
        self.registry.update(id, |status| status.output_writes = output_writes);
        tracing::debug!(
            target: "batch",
            job_id = %id,
            records = writer.len(),
            output = %writer.path().display(),
            "results persisted"
        );
        Ok(())
    }

    async fn run_unit(
        &self,
        key: UnitKey,
        url: String,
        tax_rate: f64,
        writer: &RecordWriter,
    ) -> UnitOutcome {
        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(target: "batch", key = %key, url = %url, error = %err, "unit failed");
                return UnitOutcome::Failed(UnitFailure {
                    url,
                    error: err.to_string(),
                });
            }
        };

        let fields = extract::extract(&page);
        if fields.is_empty() {
            tracing::debug!(target: "batch", key = %key, url = %url, "no fields matched");
        }
        let item = ScrapedItem::new(url.clone(), fields, tax_rate);

        match self.config.flush_policy {
            FlushPolicy::BatchEnd => writer.merge(key, item),
            FlushPolicy::EachUnit => {
                if let Err(err) = writer.record(key, item).await {
                    tracing::warn!(target: "batch", key = %key, url = %url, error = %err, "unit write failed");
                    return UnitOutcome::Failed(UnitFailure {
                        url,
                        error: format!("{err:#}"),
                    });
                }
            }
        }
        UnitOutcome::Recorded
    }
}

/// Waits on one batch task. A batch that panicked or was cancelled never
/// reached `Done` itself, so it is closed here with the reason.
async fn supervise(registry: Arc<JobRegistry>, id: Uuid, batch: JoinHandle<()>) {
    let Err(err) = batch.await else {
        return;
    };
    let reason = if err.is_panic() {
        "batch task panicked"
    } else {
        "batch task was cancelled"
    };
    tracing::error!(target: "batch", job_id = %id, error = %err, "{reason}");
    registry.abandon(id, reason);
}

/// Trimmed, non-blank lines with exact duplicates removed, first occurrence kept.
pub fn unique_urls(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}
