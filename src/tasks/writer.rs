use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::domain::{ScrapedItem, UnitKey};

pub type ResultTable = BTreeMap<UnitKey, ScrapedItem>;

/// Shared result table of one batch and the output file it is flushed to.
///
/// Every unit owns exactly one key. Flushes are serialized and each one
/// snapshots the table while holding the flush lock, so whichever flush lands
/// last on disk contains every item merged before it started.
pub struct RecordWriter {
    path: PathBuf,
    table: Mutex<ResultTable>,
    flush_lock: tokio::sync::Mutex<()>,
    flushes: AtomicUsize,
}

impl RecordWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(ResultTable::new()),
            flush_lock: tokio::sync::Mutex::new(()),
            flushes: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn merge(&self, key: UnitKey, item: ScrapedItem) {
        let previous = self.table.lock().insert(key, item);
        if previous.is_some() {
            tracing::warn!(target: "writer", key = %key, "unit key recorded twice; keeping latest");
        }
    }

    /// Merges the item and rewrites the whole table to disk.
    pub async fn record(&self, key: UnitKey, item: ScrapedItem) -> Result<()> {
        self.merge(key, item);
        self.flush().await
    }

    pub async fn flush(&self) -> Result<()> {
        let _guard = self.flush_lock.lock().await;
        let (bytes, records) = {
            let table = self.table.lock();
            (render(&table)?, table.len())
        };
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("failed to write output file {}", self.path.display()))?;
        self.flushes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "writer", path = %self.path.display(), records, "result table flushed");
        Ok(())
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }
}

fn render(table: &ResultTable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    table.serialize(&mut serializer)?;
    Ok(buf)
}
