//! TransactionRecord: one issuer's trading summary for one day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// End-of-day trading record, keyed by `(issuer, date)`.
///
/// `max` and `min` are absent on days without trades; the source leaves those
/// cells blank while still reporting the last trade price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub issuer: String,
    pub date: NaiveDate,
    pub last_trade_price: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub volume: i64,
    pub turnover_best: i64,
}

