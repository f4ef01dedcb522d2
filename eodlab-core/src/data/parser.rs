//! History page parser.
//!
//! Extracts [`TransactionRecord`]s from the HTML table the source returns for
//! one issuer and date window. The first row of the first table is the
//! header; each following row is one trading day.

use super::columns::{ColumnIndex, ColumnMap, ColumnMapError};
use super::normalize::{parse_decimal, parse_integer};
use crate::domain::TransactionRecord;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format used by the source's table cells and form fields.
pub const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Error)]
pub enum ParseError {
    /// The page layout no longer matches the column map.
    #[error("history table layout changed: {0}")]
    SchemaDrift(#[from] ColumnMapError),
}

/// Row accounting for a parsed page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub rows_seen: usize,
    pub rows_dropped: usize,
}

impl ParseStats {
    pub fn rows_kept(&self) -> usize {
        self.rows_seen - self.rows_dropped
    }

    pub fn merge(&mut self, other: ParseStats) {
        self.rows_seen += other.rows_seen;
        self.rows_dropped += other.rows_dropped;
    }
}

/// Records parsed from one page plus drop accounting.
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub records: Vec<TransactionRecord>,
    pub stats: ParseStats,
}

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static CSS selector")
}

/// Parses history pages against a validated [`ColumnMap`].
pub struct RecordParser {
    columns: ColumnMap,
}

impl RecordParser {
    pub fn new(columns: ColumnMap) -> Self {
        Self { columns }
    }

    /// Parse one page for `issuer`.
    ///
    /// A page without a table means the window has no trading data and yields
    /// no records. Rows whose date or numeric fields do not parse are dropped
    /// whole and counted in [`ParseStats::rows_dropped`].
    pub fn parse(&self, issuer: &str, html: &str) -> Result<ParsedPage, ParseError> {
        let (table_sel, row_sel) = (selector("table"), selector("tr"));
        let (th, td) = (selector("th"), selector("td"));

        let document = Html::parse_document(html);
        let Some(table) = document.select(&table_sel).next() else {
            return Ok(ParsedPage::default());
        };

        let mut rows = table.select(&row_sel);
        let Some(header_row) = rows.next() else {
            return Ok(ParsedPage::default());
        };

        let mut header: Vec<String> = header_row
            .select(&th)
            .map(cell_text)
            .collect();
        if header.is_empty() {
            header = header_row.select(&td).map(cell_text).collect();
        }
        let index = self.columns.resolve(&header)?;

        let mut page = ParsedPage::default();
        for row in rows {
            let cells: Vec<String> = row.select(&td).map(cell_text).collect();
            if cells.is_empty() {
                continue;
            }
            page.stats.rows_seen += 1;
            match parse_row(issuer, &cells, &index) {
                Some(record) => page.records.push(record),
                None => {
                    tracing::debug!(issuer, ?cells, "dropping malformed row");
                    page.stats.rows_dropped += 1;
                }
            }
        }

        Ok(page)
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(ColumnMap::default())
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Optional decimal: blank is `Some(None)`, garbage is `None`.
fn optional_decimal(raw: &str) -> Option<Option<f64>> {
    if raw.trim().is_empty() {
        Some(None)
    } else {
        parse_decimal(raw).map(Some)
    }
}

fn parse_row(issuer: &str, cells: &[String], index: &ColumnIndex) -> Option<TransactionRecord> {
    if cells.len() < index.width() {
        return None;
    }
    let date = NaiveDate::parse_from_str(cells[index.date].trim(), SOURCE_DATE_FORMAT).ok()?;

    Some(TransactionRecord {
        issuer: issuer.to_string(),
        date,
        last_trade_price: parse_decimal(&cells[index.last_trade_price])?,
        max: optional_decimal(&cells[index.max])?,
        min: optional_decimal(&cells[index.min])?,
        volume: parse_integer(&cells[index.volume])?,
        turnover_best: parse_integer(&cells[index.turnover_best])?,
    })
}
