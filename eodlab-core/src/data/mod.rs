//! Source access and page processing: catalog, planning, fetch, parse.

pub mod catalog;
pub mod columns;
pub mod history;
pub mod normalize;
pub mod parser;
pub mod planner;
pub mod source;

pub use catalog::{CatalogListing, IssuerCatalog};
pub use columns::{default_columns, ColumnMap, ColumnMapError, ColumnSpec, Field};
pub use history::{HistoryClient, RetryPolicy};
pub use normalize::normalize;
pub use parser::{ParseError, ParseStats, ParsedPage, RecordParser};
pub use planner::{
    start_date, RangePlanner, DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS, MAX_WINDOW_DAYS,
};
pub use source::{HttpSettings, HttpTransport, SourceError, SourceResponse, Transport};
