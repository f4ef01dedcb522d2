//! eodlab Core: domain types, source access, page parsing and storage.
//!
//! This crate contains the building blocks of the ingestion pipeline:
//! - Domain types (issuers, transaction records, date ranges)
//! - Locale normalization for the source's numeric text
//! - Declarative column mapping and the history page parser
//! - Range planning against the source's one-year request limit
//! - HTTP transport, issuer catalog and history client with narrow retry
//! - SQLite store with idempotent upsert, watermarks and read queries

pub mod data;
pub mod domain;
pub mod store;
