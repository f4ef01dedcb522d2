//! Locale normalization for numeric cells.
//!
//! The source prints numbers in the Macedonian convention: `.` groups
//! thousands and `,` separates decimals (`1.234,56`). Before parsing we swap
//! the two symbols through a sentinel so neither aliases the other, then drop
//! the grouping commas the swap leaves behind.
//!
//! The transformation is not idempotent (`"1234.56"` would become `"123456"`),
//! so each raw field goes through [`normalize`] exactly once.

/// Placeholder that never appears in source text.
const SENTINEL: &str = "\u{1F}";

/// Convert a source-locale numeric string into standard decimal form.
///
/// ```
/// use eodlab_core::data::normalize::normalize;
/// assert_eq!(normalize("1.234,56"), "1234.56");
/// assert_eq!(normalize("12,50"), "12.50");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .replace(',', SENTINEL)
        .replace('.', ",")
        .replace(SENTINEL, ".")
        .replace(',', "")
}

/// Parse a source-locale decimal. `None` for blank or non-numeric cells.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a source-locale integer (volume, turnover).
///
/// Accepts a decimal form only when it has no fractional part (`"1.200,00"`).
pub fn parse_integer(raw: &str) -> Option<i64> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }
    if let Ok(v) = normalized.parse::<i64>() {
        return Some(v);
    }
    let v = normalized.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
