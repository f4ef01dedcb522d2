//! eodlab Runner: configuration, ingestion orchestration, export, logging.
//!
//! This crate builds on `eodlab-core` to provide:
//! - TOML configuration with defaults for every field
//! - The ingestion orchestrator and its run summary
//! - Progress reporting through `tracing`
//! - JSON and CSV export of stored history
//! - Subscriber setup for the binary

pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod progress;

pub use config::{ConfigError, IngestConfig, IngestSettings, SourceConfig, StoreConfig};
pub use export::{export_records_csv, export_records_json, write_summary_report, ExportFormat};
pub use ingest::{
    FailedWindow, IngestBatch, IngestBuildError, IngestError, IngestSummary, Ingestor,
    IssuerReport, PhaseDurations,
};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use progress::{IngestProgress, LogProgress, SilentProgress};
