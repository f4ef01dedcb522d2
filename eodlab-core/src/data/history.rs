//! History page retrieval with the source's narrow retry policy.
//!
//! A 503 means the source is briefly overloaded; it gets exactly one retry.
//! Every other status and every transport fault is returned to the caller on
//! the first attempt.

use super::parser::SOURCE_DATE_FORMAT;
use super::source::{SourceError, Transport, STATUS_UNAVAILABLE};
use crate::domain::DateRange;
use std::sync::Arc;
use std::time::Duration;

/// Retry settings for history fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after a 503, on top of the first attempt.
    pub max_retries: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Fetches one issuer's history page for one date window.
pub struct HistoryClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    retry: RetryPolicy,
}

impl HistoryClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            retry,
        }
    }

    /// History endpoint for an issuer: `{base_url}/{issuer}`.
    pub fn history_url(&self, issuer: &str) -> String {
        format!("{}/{issuer}", self.base_url.trim_end_matches('/'))
    }

    /// Form body the source expects: `FromDate`/`ToDate` as `MM/DD/YYYY`.
    pub fn form(range: &DateRange) -> [(&'static str, String); 2] {
        [
            ("FromDate", range.from().format(SOURCE_DATE_FORMAT).to_string()),
            ("ToDate", range.to().format(SOURCE_DATE_FORMAT).to_string()),
        ]
    }

    /// POST the window and return the page body.
    pub fn fetch(&self, issuer: &str, range: &DateRange) -> Result<String, SourceError> {
        let url = self.history_url(issuer);
        let form = Self::form(range);
        let attempts = self.retry.max_retries + 1;

        for attempt in 1..=attempts {
            if attempt > 1 && !self.retry.delay.is_zero() {
                std::thread::sleep(self.retry.delay);
            }

            let resp = self.transport.post_form(&url, &form)?;
            if resp.is_success() {
                return Ok(resp.body);
            }
            if resp.status != STATUS_UNAVAILABLE {
                return Err(SourceError::HttpStatus {
                    url,
                    status: resp.status,
                });
            }
            if attempt < attempts {
                tracing::warn!(issuer, %range, attempt, "source unavailable, retrying");
            }
        }

        Err(SourceError::Unavailable { url, attempts })
    }
}
