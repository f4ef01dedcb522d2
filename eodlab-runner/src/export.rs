//! Export of stored history and run reports.
//!
//! - **JSON**: pretty-printed records, coverage and ingestion summaries
//! - **CSV**: one row per trading day, suitable for spreadsheets

use std::path::Path;

use anyhow::{Context, Result};
use eodlab_core::domain::TransactionRecord;
use eodlab_core::store::IssuerCoverage;
use serde::{Deserialize, Serialize};

use crate::ingest::IngestSummary;

/// Output format for `history`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn render(self, records: &[TransactionRecord]) -> Result<String> {
        match self {
            Self::Json => export_records_json(records),
            Self::Csv => export_records_csv(records),
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_records_json(records: &[TransactionRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("failed to serialize records to JSON")
}

pub fn export_coverage_json(coverage: &[IssuerCoverage]) -> Result<String> {
    serde_json::to_string_pretty(coverage).context("failed to serialize coverage to JSON")
}

/// Write the run summary as a JSON report, creating parent directories.
pub fn write_summary_report(summary: &IngestSummary, path: &Path) -> Result<()> {
    let json = summary
        .to_json()
        .context("failed to serialize ingestion summary")?;
    write_file(path, &json)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: issuer, date, last_trade_price, max, min, volume, turnover_best.
///
/// Missing `max`/`min` are written as empty fields.
pub fn export_records_csv(records: &[TransactionRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "issuer",
        "date",
        "last_trade_price",
        "max",
        "min",
        "volume",
        "turnover_best",
    ])?;

    for r in records {
        wtr.write_record(&[
            r.issuer.clone(),
            r.date.to_string(),
            r.last_trade_price.to_string(),
            optional(r.max),
            optional(r.min),
            r.volume.to_string(),
            r.turnover_best.to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn records() -> Vec<TransactionRecord> {
        vec![
            TransactionRecord {
                issuer: "KMB".into(),
                date: NaiveDate::from_ymd_opt(2024, 10, 8).unwrap(),
                last_trade_price: 21_100.5,
                max: Some(21_200.0),
                min: Some(21_000.0),
                volume: 12,
                turnover_best: 253_206,
            },
            TransactionRecord {
                issuer: "KMB".into(),
                date: NaiveDate::from_ymd_opt(2024, 10, 9).unwrap(),
                last_trade_price: 21_100.5,
                max: None,
                min: None,
                volume: 0,
                turnover_best: 0,
            },
        ]
    }

    #[test]
    fn csv_has_header_and_blank_optionals() {
        let csv = export_records_csv(&records()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "issuer,date,last_trade_price,max,min,volume,turnover_best"
        );
        assert_eq!(lines[1], "KMB,2024-10-08,21100.5,21200,21000,12,253206");
        assert_eq!(lines[2], "KMB,2024-10-09,21100.5,,,0,0");
    }

    #[test]
    fn json_roundtrips_records() {
        let json = ExportFormat::Json.render(&records()).unwrap();
        let back: Vec<TransactionRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records());
        assert!(json.contains("\"max\": null"));
    }

    #[test]
    fn empty_csv_is_header_only() {
        let csv = export_records_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn report_is_written_under_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.json");
        let summary = IngestSummary {
            rows_written: 7,
            ..IngestSummary::default()
        };
        write_summary_report(&summary, &path).unwrap();
        let back: IngestSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.rows_written, 7);
    }
}
