//! Ingestion orchestrator: catalog → watermark → plan → fetch → parse → upsert.
//!
//! Every planned window of an issuer runs one fetch+parse cycle, oldest
//! first. Records are accumulated in issuer order, then window order, then
//! page order, and persisted with a single batched upsert once all fetching
//! is done. A run therefore either writes everything it parsed or nothing.
//!
//! The first failed history fetch for an issuer ends that issuer's run: its
//! later windows are skipped and only rows from earlier windows are kept. The
//! stored watermark thus never moves past a gap, and the next run resumes at
//! the failed window. Catalog failures, schema drift and store failures abort
//! the whole run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use eodlab_core::data::{
    start_date, HistoryClient, HttpTransport, IssuerCatalog, ParseError, ParseStats,
    RangePlanner, RecordParser, SourceError, Transport,
};
use eodlab_core::domain::{DateRange, Issuer, TransactionRecord};
use eodlab_core::store::{SqliteStore, StoreError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, IngestConfig};
use crate::progress::IngestProgress;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read issuer catalog: {0}")]
    Catalog(#[source] SourceError),

    #[error("schema drift for {issuer} in window {window}: {source}")]
    SchemaDrift {
        issuer: String,
        window: DateRange,
        #[source]
        source: ParseError,
    },

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// A window that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWindow {
    pub issuer: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Still 503 after the retry, as opposed to any other failure.
    pub unavailable: bool,
    pub reason: String,
}

/// Per-issuer outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerReport {
    pub issuer: String,
    /// Inclusive start date the plan began from.
    pub start: NaiveDate,
    pub windows_planned: usize,
    pub windows_fetched: usize,
    /// Windows after a failed one, left for the next run.
    pub windows_skipped: usize,
    /// Rows parsed for this issuer (before the batch write).
    pub rows: usize,
    pub rows_dropped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub fetch_ms: u64,
    pub write_ms: u64,
    pub total_ms: u64,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Reference date the plan was computed against.
    pub today: Option<NaiveDate>,
    pub issuers_discovered: usize,
    /// Catalog codes rejected by the digit filter.
    pub issuers_excluded: Vec<String>,
    pub windows_planned: usize,
    pub windows_fetched: usize,
    pub windows_skipped: usize,
    /// At most one per issuer: the window that stopped it.
    pub failed_windows: Vec<FailedWindow>,
    pub rows_parsed: usize,
    pub rows_dropped: usize,
    pub rows_written: usize,
    pub issuers: Vec<IssuerReport>,
    pub durations: PhaseDurations,
}

impl IngestSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed_windows.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Everything fetched in one run, in write order, before it is stored.
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    pub records: Vec<TransactionRecord>,
    pub summary: IngestSummary,
}

/// Issuer plus its planned windows.
#[derive(Debug, Clone)]
struct IssuerPlan {
    issuer: Issuer,
    start: NaiveDate,
    windows: Vec<DateRange>,
}

/// Result of running the windows of one issuer.
#[derive(Debug)]
struct IssuerOutcome {
    records: Vec<TransactionRecord>,
    stats: ParseStats,
    failed: Option<FailedWindow>,
    report: IssuerReport,
}

/// Runs the full pipeline against one store.
pub struct Ingestor {
    catalog: IssuerCatalog,
    client: HistoryClient,
    parser: RecordParser,
    planner: RangePlanner,
    lookback_days: u64,
    workers: usize,
}

impl Ingestor {
    /// Build from configuration with an explicit transport.
    pub fn new(config: &IngestConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        let source = &config.source;
        Ok(Self {
            catalog: IssuerCatalog::new(
                Arc::clone(&transport),
                source.catalog_url.clone(),
                source.catalog_select_id.clone(),
            ),
            client: HistoryClient::new(transport, source.history_url.clone(), source.retry_policy()),
            parser: RecordParser::new(config.column_map()?),
            planner: RangePlanner::new(config.ingest.window_days),
            lookback_days: config.ingest.lookback_days,
            workers: config.ingest.workers.max(1),
        })
    }

    /// Build from configuration over a real HTTP transport.
    pub fn from_config(config: &IngestConfig) -> Result<Self, IngestBuildError> {
        let transport = HttpTransport::new(&config.source.http_settings())?;
        Ok(Self::new(config, Arc::new(transport))?)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Execute one run. `today` is the upper bound of every plan.
    pub fn run(
        &self,
        store: &mut SqliteStore,
        today: NaiveDate,
        progress: &dyn IngestProgress,
    ) -> Result<IngestSummary, IngestError> {
        let started = Instant::now();
        let IngestBatch {
            records,
            mut summary,
        } = self.collect(store, today, progress)?;

        let write_started = Instant::now();
        summary.rows_written = store.upsert(&records)?;
        summary.durations.write_ms = millis(write_started.elapsed());
        summary.durations.total_ms = millis(started.elapsed());

        progress.on_complete(&summary);
        Ok(summary)
    }

    /// Catalog, plan and fetch without writing.
    ///
    /// The store is only read for watermarks. Records come back in the order
    /// [`run`](Self::run) persists them.
    pub fn collect(
        &self,
        store: &SqliteStore,
        today: NaiveDate,
        progress: &dyn IngestProgress,
    ) -> Result<IngestBatch, IngestError> {
        let listing = self.catalog.discover().map_err(IngestError::Catalog)?;
        progress.on_catalog(&listing);

        // Watermarks are read up front so workers never touch the store.
        let watermarks: HashMap<String, NaiveDate> = store
            .watermarks()?
            .into_iter()
            .map(|c| (c.issuer, c.last_date))
            .collect();

        let plans: Vec<IssuerPlan> = listing
            .issuers
            .iter()
            .map(|issuer| {
                let watermark = watermarks.get(issuer.as_str()).copied();
                let start = start_date(watermark, today, self.lookback_days);
                debug!(issuer = %issuer, ?watermark, %start, "planned");
                IssuerPlan {
                    issuer: issuer.clone(),
                    start,
                    windows: self.planner.split(start, today),
                }
            })
            .collect();

        let total = plans.len();
        let fetch_started = Instant::now();
        let outcomes: Vec<IssuerOutcome> = if self.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()?;
            pool.install(|| {
                plans
                    .par_iter()
                    .enumerate()
                    .map(|(i, plan)| self.run_issuer(plan, i, total, progress))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            plans
                .iter()
                .enumerate()
                .map(|(i, plan)| self.run_issuer(plan, i, total, progress))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut summary = IngestSummary {
            today: Some(today),
            issuers_discovered: listing.issuers.len(),
            issuers_excluded: listing.excluded,
            windows_planned: plans.iter().map(|p| p.windows.len()).sum(),
            ..IngestSummary::default()
        };
        summary.durations.fetch_ms = millis(fetch_started.elapsed());

        let mut records = Vec::new();
        let mut stats = ParseStats::default();
        for outcome in outcomes {
            records.extend(outcome.records);
            stats.merge(outcome.stats);
            summary.windows_fetched += outcome.report.windows_fetched;
            summary.windows_skipped += outcome.report.windows_skipped;
            summary.failed_windows.extend(outcome.failed);
            summary.issuers.push(outcome.report);
        }
        summary.rows_parsed = records.len();
        summary.rows_dropped = stats.rows_dropped;

        Ok(IngestBatch { records, summary })
    }

    fn run_issuer(
        &self,
        plan: &IssuerPlan,
        index: usize,
        total: usize,
        progress: &dyn IngestProgress,
    ) -> Result<IssuerOutcome, IngestError> {
        let code = plan.issuer.as_str();
        progress.on_issuer_start(code, index, total, plan.windows.len());

        let mut records = Vec::new();
        let mut stats = ParseStats::default();
        let mut failed = None;
        let mut windows_fetched = 0;

        for window in &plan.windows {
            let html = match self.client.fetch(code, window) {
                Ok(html) => html,
                Err(e) => {
                    if e.is_unavailable() {
                        warn!(issuer = code, %window, "source still unavailable after retry");
                    } else {
                        warn!(issuer = code, %window, error = %e, "window fetch failed");
                    }
                    failed = Some(FailedWindow {
                        issuer: code.to_string(),
                        from: window.from(),
                        to: window.to(),
                        unavailable: e.is_unavailable(),
                        reason: e.to_string(),
                    });
                    break;
                }
            };
            windows_fetched += 1;

            let page = self
                .parser
                .parse(code, &html)
                .map_err(|source| IngestError::SchemaDrift {
                    issuer: code.to_string(),
                    window: *window,
                    source,
                })?;
            debug!(issuer = code, %window, rows = page.records.len(), "window parsed");
            stats.merge(page.stats);
            records.extend(page.records);
        }

        let windows_skipped = plan.windows.len() - windows_fetched - usize::from(failed.is_some());
        if windows_skipped > 0 {
            debug!(issuer = code, windows_skipped, "remaining windows left for the next run");
        }

        let report = IssuerReport {
            issuer: code.to_string(),
            start: plan.start,
            windows_planned: plan.windows.len(),
            windows_fetched,
            windows_skipped,
            rows: records.len(),
            rows_dropped: stats.rows_dropped,
        };
        progress.on_issuer_complete(&report, index, total);

        Ok(IssuerOutcome {
            records,
            stats,
            failed,
            report,
        })
    }
}

/// Failure to assemble an [`Ingestor`] from configuration.
#[derive(Debug, Error)]
pub enum IngestBuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] SourceError),
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
