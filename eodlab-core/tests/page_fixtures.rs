//! Parser and catalog tests against captured source pages.

use chrono::NaiveDate;
use eodlab_core::data::catalog::parse_listing;
use eodlab_core::data::{ColumnMap, RecordParser};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn history_fixture_parses_all_well_formed_rows() {
    let parser = RecordParser::new(ColumnMap::default());
    let page = parser
        .parse("KMB", &fixture("symbol_history_kmb.html"))
        .unwrap();

    assert_eq!(page.stats.rows_seen, 5);
    assert_eq!(page.stats.rows_dropped, 1);
    assert_eq!(page.records.len(), page.stats.rows_seen - page.stats.rows_dropped);

    let dates: Vec<NaiveDate> = page.records.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![d(2024, 10, 10), d(2024, 10, 9), d(2024, 10, 8), d(2024, 10, 4)]
    );

    let first = &page.records[0];
    assert_eq!(first.last_trade_price, 21900.0);
    assert_eq!(first.max, Some(21900.0));
    assert_eq!(first.min, Some(21800.0));
    assert_eq!(first.volume, 15);
    assert_eq!(first.turnover_best, 328_000);

    // No-trade day keeps the price but has no range.
    let quiet = &page.records[1];
    assert_eq!(quiet.max, None);
    assert_eq!(quiet.volume, 0);

    // Turnover comes from the BEST column, not the total.
    assert_eq!(page.records[3].turnover_best, 808_500);
}

#[test]
fn empty_window_fixture_has_no_rows() {
    let page = RecordParser::default()
        .parse("ALK", &fixture("symbol_history_empty.html"))
        .unwrap();
    assert!(page.records.is_empty());
    assert_eq!(page.stats.rows_seen, 0);
}

#[test]
fn listing_fixture_yields_equity_issuers_only() {
    let listing = parse_listing(&fixture("symbol_listing.html"), "Code").unwrap();
    let codes: Vec<&str> = listing.issuers.iter().map(|i| i.as_str()).collect();

    assert_eq!(codes, vec!["ADIN", "ALK", "ALKB", "GRNT", "KMB", "TEL", "TTK"]);
    assert_eq!(listing.excluded, vec!["DPMZ20", "RMDEN19", "RMDEN21"]);
    assert!(codes.iter().all(|c| !c.chars().any(|ch| ch.is_ascii_digit())));
}
