//! SQLite persistence for transaction records.
//!
//! One concrete store backs ingestion (upsert + watermarks) and the read
//! surface consumed downstream (issuer list + range queries).

pub mod query;
pub mod sqlite;
pub mod watermark;

pub use query::IssuerCoverage;
pub use sqlite::{SqliteStore, StoreError};
