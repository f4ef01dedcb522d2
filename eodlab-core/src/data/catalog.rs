//! Issuer discovery from the source's symbol listing.
//!
//! The listing is an HTML page whose `<select id="Code">` control carries one
//! `<option value="…">` per listed instrument. Codes containing a digit mark
//! bonds and other non-equity instruments and are excluded.
//!
//! Unlike history fetches, catalog fetches are never retried: if the listing
//! is unavailable the run cannot proceed and should say so immediately.

use super::parser::selector;
use super::source::{SourceError, Transport};
use crate::domain::Issuer;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Result of reading the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogListing {
    /// Unique equity issuers, sorted by code.
    pub issuers: Vec<Issuer>,
    /// Distinct codes rejected by the digit filter.
    pub excluded: Vec<String>,
}

pub struct IssuerCatalog {
    transport: Arc<dyn Transport>,
    url: String,
    select_id: String,
}

impl IssuerCatalog {
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>, select_id: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            select_id: select_id.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and filter the listing. Errors propagate without retry.
    pub fn discover(&self) -> Result<CatalogListing, SourceError> {
        let resp = self.transport.get(&self.url)?;
        if !resp.is_success() {
            return Err(SourceError::HttpStatus {
                url: self.url.clone(),
                status: resp.status,
            });
        }
        parse_listing(&resp.body, &self.select_id)
    }
}

/// Extract issuer codes from a listing page.
pub fn parse_listing(html: &str, select_id: &str) -> Result<CatalogListing, SourceError> {
    let document = Html::parse_document(html);
    let select_css = format!("select#{select_id}");
    let select = Selector::parse(&select_css)
        .map_err(|e| SourceError::ResponseFormatChanged(format!("bad select id '{select_id}': {e:?}")))?;
    let option = selector("option");

    let control = document.select(&select).next().ok_or_else(|| {
        SourceError::ResponseFormatChanged(format!("listing has no <select id=\"{select_id}\">"))
    })?;

    let mut issuers = BTreeSet::new();
    let mut excluded = BTreeSet::new();
    for opt in control.select(&option) {
        let Some(code) = opt.value().attr("value") else {
            continue;
        };
        if code.trim().is_empty() {
            continue;
        }
        match Issuer::parse(code) {
            Some(issuer) => {
                issuers.insert(issuer);
            }
            None => {
                excluded.insert(code.trim().to_string());
            }
        }
    }

    Ok(CatalogListing {
        issuers: issuers.into_iter().collect(),
        excluded: excluded.into_iter().collect(),
    })
}
