//! The running tracker: serialized mutations over one record store, plus
//! the startup, scheduled and manual refresh triggers.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{Result, TrackerError};
use crate::metrics::MetricsCollector;
use crate::models::{ExpenseRecord, ListFilter, PermissionStatus, RawMessage};
use crate::persistence::KeyValueStore;
use crate::pipeline::{IngestReport, Pipeline};
use crate::query::{aggregate_by_category, filter, Distribution};
use crate::source::{MessageSource, PermissionGate};
use crate::store::RecordStore;

struct Inner {
    store: RecordStore,
    metrics: MetricsCollector,
}

/// The running tracker: one record store, one pipeline, one message source.
///
/// Cloning is cheap and every clone shares the same store. Mutations take
/// the store lock, so a refresh triggered while another is running waits
/// for it to finish.
#[derive(Clone)]
pub struct ExpenseTracker {
    inner: Arc<Mutex<Inner>>,
    pipeline: Arc<Pipeline>,
    source: Arc<dyn MessageSource>,
    backend: Arc<dyn KeyValueStore>,
    filter: ListFilter,
    poll_interval: Duration,
}

impl ExpenseTracker {
    /// Load the persisted snapshot and build the pipeline from `config`
    pub fn open(config: &AppConfig, backend: Arc<dyn KeyValueStore>, source: Arc<dyn MessageSource>) -> Result<Self> {
        let store = RecordStore::open(backend, &config.storage.key, config.storage.reset_on_corrupt)?;
        let pipeline = Pipeline::from_config(config)?;
        Ok(Self::with_parts(
            pipeline,
            store,
            source,
            config.list_filter(),
            Duration::from_secs(config.pipeline.poll_interval_secs),
        ))
    }

    /// Assemble a tracker from already built parts
    pub fn with_parts(
        pipeline: Pipeline,
        store: RecordStore,
        source: Arc<dyn MessageSource>,
        filter: ListFilter,
        poll_interval: Duration,
    ) -> Self {
        let backend = store.backend();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                store,
                metrics: MetricsCollector::default(),
            })),
            pipeline: Arc::new(pipeline),
            source,
            backend,
            filter,
            poll_interval,
        }
    }

    /// Ask for read permission, then run the initial ingest.
    ///
    /// A denial is final: nothing is read and `PermissionDenied` is returned.
    pub async fn start(&self, gate: &dyn PermissionGate) -> Result<usize> {
        match gate.request().await {
            PermissionStatus::Granted => {
                info!("Message access granted");
                Ok(self.refresh().await)
            },
            PermissionStatus::Denied => {
                warn!("Message access denied");
                Err(TrackerError::PermissionDenied)
            },
        }
    }

    /// Read the source and merge whatever is new. Returns how many records
    /// were added; a failing source is logged and counts as zero.
    pub async fn refresh(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let messages = match self.source.list(&self.filter).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Failed to list messages");
                inner.metrics.record_source_failure();
                return 0;
            },
        };
        self.ingest_locked(&mut inner, &messages).added_count()
    }

    /// Run an already fetched batch through the pipeline
    pub async fn ingest(&self, messages: &[RawMessage]) -> IngestReport {
        let mut inner = self.inner.lock().await;
        self.ingest_locked(&mut inner, messages)
    }

    fn ingest_locked(&self, inner: &mut Inner, messages: &[RawMessage]) -> IngestReport {
        let started = Instant::now();
        let report = self.pipeline.ingest(messages, &mut inner.store);
        inner.metrics.record_ingest(&report, started.elapsed());
        if report.added_count() > 0 {
            self.schedule_flush();
        }
        report
    }

    // Durability runs on the blocking pool; callers do not wait for it.
    fn schedule_flush(&self) {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = backend.flush() {
                error!(error = %e, "Failed to flush snapshot");
            }
        });
    }

    /// Wait until every snapshot written so far is durable
    pub async fn flush(&self) -> Result<()> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.flush())
            .await
            .map_err(|e| TrackerError::Storage(format!("Flush task failed: {e}")))?
    }

    /// Remove the record with `id`; false when there was none
    pub async fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.store.delete(id);
        inner.metrics.record_deletion(removed);
        if removed {
            info!(id = %id, "Deleted record");
            self.schedule_flush();
        }
        removed
    }

    /// Every record, most recently ingested first
    pub async fn records(&self) -> Vec<ExpenseRecord> {
        self.inner.lock().await.store.snapshot().to_vec()
    }

    /// Records matching `text` in any field, ignoring case
    pub async fn search(&self, text: &str) -> Vec<ExpenseRecord> {
        filter(self.inner.lock().await.store.snapshot(), text)
    }

    /// Per-category totals and percentages
    pub async fn distribution(&self) -> Distribution {
        aggregate_by_category(self.inner.lock().await.store.snapshot())
    }

    /// Copy of the running totals
    pub async fn metrics(&self) -> MetricsCollector {
        self.inner.lock().await.metrics.clone()
    }

    /// Snapshot writes that failed since the tracker was opened
    pub async fn write_failures(&self) -> u64 {
        self.inner.lock().await.store.write_failures()
    }

    /// Refresh on every poll tick and on every manual trigger until
    /// `shutdown` resolves. The first tick is skipped since `start` already
    /// ingested. A refresh in progress when shutdown arrives completes.
    pub async fn run<F>(&self, mut manual: mpsc::Receiver<()>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        tokio::pin!(shutdown);
        let mut manual_open = true;
        info!(interval_secs = self.poll_interval.as_secs(), "Watching for new messages");

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutting down");
                    break;
                }
                trigger = manual.recv(), if manual_open => match trigger {
                    Some(()) => {
                        let added = self.refresh().await;
                        info!(added, "Manual refresh finished");
                    },
                    None => manual_open = false,
                },
                _ = ticker.tick() => {
                    let added = self.refresh().await;
                    info!(added, "Scheduled refresh finished");
                }
            }
        }
    }
}
