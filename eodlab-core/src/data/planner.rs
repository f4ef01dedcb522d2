//! Range planning: where to resume and how to page through history.
//!
//! The source truncates any request spanning more than a year, so every
//! fetch interval is split into windows of at most [`MAX_WINDOW_DAYS`].

use crate::domain::DateRange;
use chrono::{Days, NaiveDate};

/// Longest span the source serves in one request.
pub const MAX_WINDOW_DAYS: u64 = 365;

/// Lookback used for issuers with no stored history (10 years).
pub const DEFAULT_LOOKBACK_DAYS: u64 = 3650;

/// Upper bound accepted for a configured lookback (100 years).
pub const MAX_LOOKBACK_DAYS: u64 = 36_500;

/// First date to fetch for an issuer.
///
/// Resumes *at* the watermark: the last stored day is fetched again and
/// overwritten by the upsert. Without a watermark, starts `lookback_days`
/// before `today`.
pub fn start_date(watermark: Option<NaiveDate>, today: NaiveDate, lookback_days: u64) -> NaiveDate {
    match watermark {
        Some(date) => date,
        None => today
            .checked_sub_days(Days::new(lookback_days))
            .unwrap_or(NaiveDate::MIN),
    }
}

/// Splits `[from, today]` into contiguous windows of at most `window_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePlanner {
    window_days: u64,
}

impl RangePlanner {
    /// `window_days` is clamped to `1..=MAX_WINDOW_DAYS`.
    pub fn new(window_days: u64) -> Self {
        Self {
            window_days: window_days.clamp(1, MAX_WINDOW_DAYS),
        }
    }

    pub fn window_days(&self) -> u64 {
        self.window_days
    }

    /// Chronological windows covering `[from, today]`.
    ///
    /// Consecutive windows share their boundary day. Always returns at least
    /// one window; a `from` after `today` is clamped to `today`.
    pub fn split(&self, from: NaiveDate, today: NaiveDate) -> Vec<DateRange> {
        let mut from = from.min(today);
        let mut windows = Vec::new();

        while (today - from).num_days() > self.window_days as i64 {
            let end = from + Days::new(self.window_days);
            windows.push(window(from, end));
            from = end;
        }
        windows.push(window(from, today));
        windows
    }
}

impl Default for RangePlanner {
    fn default() -> Self {
        Self::new(MAX_WINDOW_DAYS)
    }
}

fn window(from: NaiveDate, to: NaiveDate) -> DateRange {
    // from <= to holds by construction in `split`.
    DateRange::new(from, to).unwrap_or_else(|_| unreachable!("window start after end"))
}
