//! Read-only query surface consumed by downstream analytics.

use super::sqlite::{SqliteStore, StoreError};
use crate::domain::{DateRange, TransactionRecord};
use chrono::NaiveDate;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Stored date range and row count for one issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerCoverage {
    pub issuer: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub rows: usize,
}

impl SqliteStore {
    /// Distinct stored issuers, ordered by code.
    pub fn list_issuers(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT issuer FROM transactions ORDER BY issuer")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Rows for `issuer` with `range.from() <= date <= range.to()`, by date.
    pub fn select_range(
        &self,
        issuer: &str,
        range: &DateRange,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT issuer, date, last_trade_price, max, min, volume, turnover_best
             FROM transactions
             WHERE issuer = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date",
        )?;
        let rows = stmt.query_map(params![issuer, range.from(), range.to()], |row| {
            Ok(TransactionRecord {
                issuer: row.get(0)?,
                date: row.get(1)?,
                last_trade_price: row.get(2)?,
                max: row.get(3)?,
                min: row.get(4)?,
                volume: row.get(5)?,
                turnover_best: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(issuer: &str, date: NaiveDate, price: f64) -> TransactionRecord {
        TransactionRecord {
            issuer: issuer.into(),
            date,
            last_trade_price: price,
            max: Some(price),
            min: Some(price),
            volume: 1,
            turnover_best: price as i64,
        }
    }

    fn seeded() -> SqliteStore {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .upsert(&[
                record("TTK", d(2024, 3, 1), 3.0),
                record("KMB", d(2024, 1, 3), 2.0),
                record("KMB", d(2024, 1, 2), 1.0),
                record("KMB", d(2024, 2, 1), 4.0),
                record("ALK", d(2024, 1, 2), 9.0),
            ])
            .unwrap();
        store
    }

    #[test]
    fn issuers_are_distinct_and_sorted() {
        assert_eq!(seeded().list_issuers().unwrap(), vec!["ALK", "KMB", "TTK"]);
    }

    #[test]
    fn range_query_is_inclusive_and_ordered() {
        let store = seeded();
        let range = DateRange::new(d(2024, 1, 2), d(2024, 1, 3)).unwrap();
        let rows = store.select_range("KMB", &range).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2024, 1, 2));
        assert_eq!(rows[1].date, d(2024, 1, 3));
        assert!(rows.iter().all(|r| r.issuer == "KMB"));
    }

    #[test]
    fn records_survive_a_store_roundtrip() {
        let store = seeded();
        let range = DateRange::new(d(2024, 2, 1), d(2024, 2, 1)).unwrap();
        let rows = store.select_range("KMB", &range).unwrap();
        assert_eq!(rows, vec![record("KMB", d(2024, 2, 1), 4.0)]);
    }

    #[test]
    fn unknown_issuer_returns_no_rows() {
        let range = DateRange::new(d(2020, 1, 1), d(2030, 1, 1)).unwrap();
        assert!(seeded().select_range("XYZ", &range).unwrap().is_empty());
    }
}
