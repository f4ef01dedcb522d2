//! Domain types for eodlab

pub mod issuer;
pub mod range;
pub mod record;

pub use issuer::Issuer;
pub use range::{DateRange, RangeError};
pub use record::TransactionRecord;
