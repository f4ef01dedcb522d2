//! Progress reporting for ingestion runs.
//!
//! The orchestrator calls into an [`IngestProgress`] at issuer granularity.
//! Callbacks may arrive from worker threads when `ingest.workers > 1`, so
//! implementations must be `Sync`.

use eodlab_core::data::CatalogListing;
use tracing::{info, warn};

use crate::ingest::{IngestSummary, IssuerReport};

pub trait IngestProgress: Sync {
    /// Called once the catalog has been read and filtered.
    fn on_catalog(&self, listing: &CatalogListing);

    /// Called before the first window of an issuer is fetched.
    fn on_issuer_start(&self, issuer: &str, index: usize, total: usize, windows: usize);

    /// Called after every window of an issuer has been fetched and parsed.
    fn on_issuer_complete(&self, report: &IssuerReport, index: usize, total: usize);

    /// Called after the batch write.
    fn on_complete(&self, summary: &IngestSummary);
}

/// Reports progress through `tracing`.
pub struct LogProgress;

impl IngestProgress for LogProgress {
    fn on_catalog(&self, listing: &CatalogListing) {
        info!(
            issuers = listing.issuers.len(),
            excluded = listing.excluded.len(),
            "catalog loaded"
        );
    }

    fn on_issuer_start(&self, issuer: &str, index: usize, total: usize, windows: usize) {
        info!("[{}/{}] {issuer}: fetching {windows} window(s)", index + 1, total);
    }

    fn on_issuer_complete(&self, report: &IssuerReport, index: usize, total: usize) {
        if report.windows_fetched < report.windows_planned {
            warn!(
                issuer = %report.issuer,
                rows = report.rows,
                fetched = report.windows_fetched,
                planned = report.windows_planned,
                "[{}/{}] issuer stopped at a failed window",
                index + 1,
                total
            );
        } else {
            info!(issuer = %report.issuer, rows = report.rows, "[{}/{}] done", index + 1, total);
        }
    }

    fn on_complete(&self, summary: &IngestSummary) {
        info!(
            issuers = summary.issuers_discovered,
            windows = summary.windows_fetched,
            rows_written = summary.rows_written,
            total_ms = summary.durations.total_ms,
            "ingestion complete"
        );
        if summary.rows_dropped > 0 || !summary.issuers_excluded.is_empty() {
            info!(
                rows_dropped = summary.rows_dropped,
                issuers_excluded = summary.issuers_excluded.len(),
                "records skipped"
            );
        }
        if !summary.failed_windows.is_empty() {
            warn!(
                failed = summary.failed_windows.len(),
                "some windows could not be fetched; re-run to retry them"
            );
        }
    }
}

/// Discards every callback.
pub struct SilentProgress;

impl IngestProgress for SilentProgress {
    fn on_catalog(&self, _listing: &CatalogListing) {}
    fn on_issuer_start(&self, _issuer: &str, _index: usize, _total: usize, _windows: usize) {}
    fn on_issuer_complete(&self, _report: &IssuerReport, _index: usize, _total: usize) {}
    fn on_complete(&self, _summary: &IngestSummary) {}
}
