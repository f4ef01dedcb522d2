//! Store layout and idempotent writes.
//!
//! Table: `transactions`, primary key `(issuer, date)`. Dates are ISO
//! `YYYY-MM-DD` text so lexical and chronological order agree.

use crate::domain::TransactionRecord;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create store directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions(
    issuer TEXT,
    date DATE,
    last_trade_price FLOAT,
    max FLOAT,
    min FLOAT,
    volume INTEGER,
    turnover_best INTEGER,
    PRIMARY KEY (issuer, date)
)";

const UPSERT: &str = "INSERT OR REPLACE INTO transactions
    (issuer, date, last_trade_price, max, min, volume, turnover_best)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// SQLite-backed transaction store.
#[derive(Debug)]
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    /// In-memory store for tests and dry runs.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert-or-replace `records` by `(issuer, date)` in one transaction.
    ///
    /// The last record for a key wins, both within the batch and against
    /// rows already stored. Returns the number of records written.
    pub fn upsert(&mut self, records: &[TransactionRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT)?;
            for r in records {
                stmt.execute(params![
                    r.issuer,
                    r.date,
                    r.last_trade_price,
                    r.max,
                    r.min,
                    r.volume,
                    r.turnover_best
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Total number of stored rows.
    pub fn row_count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
