//! eodlab CLI: ingestion, query and config commands.
//!
//! Commands:
//! - `ingest`: bring the local store up to date with the exchange
//! - `issuers`: list stored issuers, or the live catalog with `--remote`
//! - `history`: export one issuer's stored rows as JSON or CSV
//! - `status`: per-issuer coverage of the store
//! - `config init`: write a default config file

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use eodlab_core::data::{HttpTransport, IssuerCatalog};
use eodlab_core::domain::DateRange;
use eodlab_core::store::SqliteStore;
use eodlab_runner::export::{export_coverage_json, write_file};
use eodlab_runner::{
    init_logging, write_summary_report, ExportFormat, IngestConfig, Ingestor, LogConfig,
    LogProgress,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "eodlab.toml";

#[derive(Parser)]
#[command(
    name = "eodlab",
    version,
    about = "eodlab: end-of-day history ingestion for the Macedonian Stock Exchange"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./eodlab.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides `store.path`).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every issuer's history since its watermark and store it.
    Ingest {
        /// Concurrent issuer fetches (overrides `ingest.workers`).
        #[arg(long)]
        workers: Option<usize>,

        /// Write the run summary as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit non-zero if any window failed to fetch.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// List issuer codes.
    Issuers {
        /// Read the exchange's live catalog instead of the store.
        #[arg(long, default_value_t = false)]
        remote: bool,
    },
    /// Export stored rows for one issuer.
    History {
        /// Issuer code (e.g. KMB).
        issuer: String,

        /// First date, inclusive (YYYY-MM-DD). Defaults to the earliest stored day.
        #[arg(long)]
        from: Option<String>,

        /// Last date, inclusive (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        to: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Write to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Report stored date range and row count per issuer.
    Status {
        /// Print as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Config file management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration.
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Format {
    Json,
    Csv,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => ExportFormat::Json,
            Format::Csv => ExportFormat::Csv,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig::from_env()) {
        eprintln!("warning: logging not initialised: {e}");
    }

    match cli.command {
        Commands::Config {
            action: ConfigAction::Init { path, force },
        } => run_config_init(&path, force),
        Commands::Ingest {
            workers,
            report,
            strict,
        } => {
            let config = load_config(cli.config.as_deref(), cli.db, workers)?;
            run_ingest(&config, report.as_deref(), strict)
        }
        Commands::Issuers { remote } => {
            let config = load_config(cli.config.as_deref(), cli.db, None)?;
            run_issuers(&config, remote)
        }
        Commands::History {
            issuer,
            from,
            to,
            format,
            output,
        } => {
            let config = load_config(cli.config.as_deref(), cli.db, None)?;
            run_history(
                &config,
                &issuer,
                from.as_deref(),
                to.as_deref(),
                format.into(),
                output.as_deref(),
            )
        }
        Commands::Status { json } => {
            let config = load_config(cli.config.as_deref(), cli.db, None)?;
            run_status(&config, json)
        }
    }
}

/// Load the config file (if any) and apply flag overrides.
fn load_config(
    path: Option<&Path>,
    db: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<IngestConfig> {
    let mut config = match path {
        Some(p) => IngestConfig::from_file(p)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            IngestConfig::from_file(Path::new(DEFAULT_CONFIG))?
        }
        None => IngestConfig::default(),
    };
    if let Some(db) = db {
        config.store.path = db;
    }
    if let Some(workers) = workers {
        config.ingest.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

fn open_store(config: &IngestConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.store.path)
        .with_context(|| format!("failed to open store {}", config.store.path.display()))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn run_ingest(config: &IngestConfig, report: Option<&Path>, strict: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let ingestor = Ingestor::from_config(config)?;
    tracing::info!(
        db = %config.store.path.display(),
        workers = ingestor.workers(),
        "starting ingestion"
    );

    let summary = ingestor.run(&mut store, today(), &LogProgress)?;

    if let Some(path) = report {
        write_summary_report(&summary, path)?;
        println!("Report written to: {}", path.display());
    }

    println!(
        "Ingested {} issuers: {} rows written, {} dropped, {} excluded codes, {} failed windows ({} ms)",
        summary.issuers_discovered,
        summary.rows_written,
        summary.rows_dropped,
        summary.issuers_excluded.len(),
        summary.failed_windows.len(),
        summary.durations.total_ms,
    );
    for w in &summary.failed_windows {
        eprintln!("  failed: {} {}..={}: {}", w.issuer, w.from, w.to, w.reason);
    }

    if strict && summary.has_failures() {
        bail!(
            "{} window(s) failed to fetch (--strict)",
            summary.failed_windows.len()
        );
    }
    Ok(())
}

fn run_issuers(config: &IngestConfig, remote: bool) -> Result<()> {
    if remote {
        let transport = HttpTransport::new(&config.source.http_settings())?;
        let catalog = IssuerCatalog::new(
            Arc::new(transport),
            config.source.catalog_url.clone(),
            config.source.catalog_select_id.clone(),
        );
        let listing = catalog
            .discover()
            .with_context(|| format!("failed to read catalog at {}", catalog.url()))?;
        for issuer in &listing.issuers {
            println!("{issuer}");
        }
        if !listing.excluded.is_empty() {
            eprintln!("excluded: {}", listing.excluded.join(", "));
        }
    } else {
        let store = open_store(config)?;
        for issuer in store.list_issuers()? {
            println!("{issuer}");
        }
    }
    Ok(())
}

fn run_history(
    config: &IngestConfig,
    issuer: &str,
    from: Option<&str>,
    to: Option<&str>,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let store = open_store(config)?;
    let from = match from {
        Some(s) => parse_date(s)?,
        None => match store.watermarks()?.into_iter().find(|c| c.issuer == issuer) {
            Some(coverage) => coverage.first_date,
            None => bail!("no stored rows for issuer '{issuer}'; run `eodlab ingest` first"),
        },
    };
    let to = to.map(parse_date).transpose()?.unwrap_or_else(today);
    let range = DateRange::new(from, to)?;

    let records = store.select_range(issuer, &range)?;
    let rendered = format.render(&records)?;

    match output {
        Some(path) => {
            write_file(path, &rendered)?;
            eprintln!("{} rows written to {}", records.len(), path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_status(config: &IngestConfig, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let coverage = store.watermarks()?;

    if json {
        println!("{}", export_coverage_json(&coverage)?);
        return Ok(());
    }

    println!("Store: {}", config.store.path.display());
    if coverage.is_empty() {
        println!("No data stored.");
        return Ok(());
    }
    println!("{:<10} {:>12} {:>12} {:>8}", "Issuer", "First", "Last", "Rows");
    println!("{}", "-".repeat(45));
    for c in &coverage {
        println!(
            "{:<10} {:>12} {:>12} {:>8}",
            c.issuer, c.first_date, c.last_date, c.rows
        );
    }
    let total: usize = coverage.iter().map(|c| c.rows).sum();
    println!("\n{} issuers, {total} rows", coverage.len());
    Ok(())
}

fn run_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let toml = IngestConfig::default().to_toml()?;
    write_file(path, &toml)?;
    println!("Default config written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ingest_flags_parse() {
        let cli = Cli::try_parse_from([
            "eodlab", "--db", "x.db", "ingest", "--workers", "4", "--strict",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Commands::Ingest {
                workers, strict, ..
            } => {
                assert_eq!(workers, Some(4));
                assert!(strict);
            }
            _ => panic!("expected ingest"),
        }
    }

    #[test]
    fn history_defaults_to_json() {
        let cli = Cli::try_parse_from(["eodlab", "history", "KMB", "--from", "2024-01-01"]).unwrap();
        match cli.command {
            Commands::History { issuer, format, .. } => {
                assert_eq!(issuer, "KMB");
                assert_eq!(format, Format::Json);
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn overrides_apply_on_top_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eodlab.toml");
        std::fs::write(&path, "[ingest]\nworkers = 2\n").unwrap();

        let config = load_config(Some(path.as_path()), Some(PathBuf::from("other.db")), Some(6)).unwrap();
        assert_eq!(config.ingest.workers, 6);
        assert_eq!(config.store.path, PathBuf::from("other.db"));
    }

    #[test]
    fn zero_workers_flag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eodlab.toml");
        std::fs::write(&path, "").unwrap();
        assert!(load_config(Some(path.as_path()), None, Some(0)).is_err());
    }

    #[test]
    fn invalid_date_is_reported() {
        let err = parse_date("10/01/2024").unwrap_err();
        assert!(err.to_string().contains("10/01/2024"));
    }
}
