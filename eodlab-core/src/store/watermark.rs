//! Watermarks: the latest stored date per issuer.

use super::query::IssuerCoverage;
use super::sqlite::{SqliteStore, StoreError};
use chrono::NaiveDate;
use rusqlite::params;

impl SqliteStore {
    /// Latest stored date for `issuer`, `None` if nothing is stored.
    pub fn watermark(&self, issuer: &str) -> Result<Option<NaiveDate>, StoreError> {
        let date = self.conn.query_row(
            "SELECT MAX(date) FROM transactions WHERE issuer = ?1",
            params![issuer],
            |row| row.get::<_, Option<NaiveDate>>(0),
        )?;
        Ok(date)
    }

    /// Stored coverage for every issuer, ordered by issuer.
    pub fn watermarks(&self) -> Result<Vec<IssuerCoverage>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT issuer, MIN(date), MAX(date), COUNT(*)
             FROM transactions
             GROUP BY issuer
             ORDER BY issuer",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(IssuerCoverage {
                issuer: row.get(0)?,
                first_date: row.get(1)?,
                last_date: row.get(2)?,
                rows: row.get::<_, i64>(3)? as usize,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
