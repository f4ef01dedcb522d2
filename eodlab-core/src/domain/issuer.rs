//! Issuer codes as published in the exchange's symbol listing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifying code for a tradeable security (e.g. `KMB`, `ALK`).
///
/// The exchange lists bonds and other non-equity instruments with codes that
/// carry a digit (`RMDEN21`, `KMB01`); those never make it into an `Issuer`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Issuer(String);

impl Issuer {
    /// Accept a listing code as an equity issuer.
    ///
    /// Returns `None` for blank codes and for codes containing a digit.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.is_empty() || code.chars().any(|c| c.is_numeric()) {
            return None;
        }
        Some(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Issuer {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
