//! Declarative mapping from history-table header labels to stored fields.
//!
//! Labels are matched exactly (after trimming). The map is validated when it
//! is built, and every page header is checked against it, so a renamed column
//! on the source side surfaces as an error instead of silently empty tables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A field of [`TransactionRecord`](crate::domain::TransactionRecord) fed by a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    LastTradePrice,
    Max,
    Min,
    Volume,
    TurnoverBest,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Date,
        Field::LastTradePrice,
        Field::Max,
        Field::Min,
        Field::Volume,
        Field::TurnoverBest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::LastTradePrice => "last_trade_price",
            Field::Max => "max",
            Field::Min => "min",
            Field::Volume => "volume",
            Field::TurnoverBest => "turnover_best",
        }
    }
}

/// What to do with a column carrying a given label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Keep(Field),
    Drop,
}

/// One row of the mapping table, as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub label: String,
    /// Target field; omitted means the column is dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
}

impl ColumnSpec {
    pub fn keep(label: &str, field: Field) -> Self {
        Self {
            label: label.to_string(),
            field: Some(field),
        }
    }

    pub fn drop(label: &str) -> Self {
        Self {
            label: label.to_string(),
            field: None,
        }
    }

    fn role(&self) -> ColumnRole {
        match self.field {
            Some(f) => ColumnRole::Keep(f),
            None => ColumnRole::Drop,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnMapError {
    #[error("column label '{0}' is mapped more than once")]
    DuplicateLabel(String),

    #[error("field '{}' is mapped by both '{first}' and '{second}'", .field.name())]
    DuplicateField {
        field: Field,
        first: String,
        second: String,
    },

    #[error("field '{}' has no column mapped to it", .0.name())]
    UnmappedField(Field),

    #[error("page header is missing column '{label}' (for field '{}'); header was {header:?}", .field.name())]
    MissingColumn {
        label: String,
        field: Field,
        header: Vec<String>,
    },
}

/// The source's history table layout.
pub fn default_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::keep("Date", Field::Date),
        ColumnSpec::keep("Last trade price", Field::LastTradePrice),
        ColumnSpec::keep("Max", Field::Max),
        ColumnSpec::keep("Min", Field::Min),
        ColumnSpec::drop("Avg. Price"),
        ColumnSpec::drop("%chg."),
        ColumnSpec::keep("Volume", Field::Volume),
        ColumnSpec::keep("Turnover in BEST in denars", Field::TurnoverBest),
        ColumnSpec::drop("Total turnover in denars"),
    ]
}

/// Validated label → role table.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    entries: Vec<(String, ColumnRole)>,
}

impl ColumnMap {
    /// Build a map, checking that labels are unique and every field is
    /// mapped exactly once.
    pub fn new(specs: &[ColumnSpec]) -> Result<Self, ColumnMapError> {
        let mut seen_labels = HashSet::new();
        let mut entries: Vec<(String, ColumnRole)> = Vec::with_capacity(specs.len());

        for spec in specs {
            let label = spec.label.trim().to_string();
            if !seen_labels.insert(label.clone()) {
                return Err(ColumnMapError::DuplicateLabel(label));
            }
            if let ColumnRole::Keep(field) = spec.role() {
                if let Some((first, _)) = entries
                    .iter()
                    .find(|(_, role)| *role == ColumnRole::Keep(field))
                {
                    return Err(ColumnMapError::DuplicateField {
                        field,
                        first: first.clone(),
                        second: label,
                    });
                }
            }
            entries.push((label, spec.role()));
        }

        for field in Field::ALL {
            if !entries
                .iter()
                .any(|(_, role)| *role == ColumnRole::Keep(field))
            {
                return Err(ColumnMapError::UnmappedField(field));
            }
        }

        Ok(Self { entries })
    }

    /// Role of a header label, `None` if the label is unknown.
    pub fn role_of(&self, label: &str) -> Option<ColumnRole> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, role)| *role)
    }

    fn label_for(&self, field: Field) -> &str {
        self.entries
            .iter()
            .find(|(_, role)| *role == ColumnRole::Keep(field))
            .map(|(l, _)| l.as_str())
            .unwrap_or_default()
    }

    /// Resolve a page header into cell positions for each field.
    pub fn resolve(&self, header: &[String]) -> Result<ColumnIndex, ColumnMapError> {
        let position = |field: Field| -> Result<usize, ColumnMapError> {
            let label = self.label_for(field);
            header
                .iter()
                .position(|h| h.trim() == label)
                .ok_or_else(|| ColumnMapError::MissingColumn {
                    label: label.to_string(),
                    field,
                    header: header.to_vec(),
                })
        };

        Ok(ColumnIndex {
            date: position(Field::Date)?,
            last_trade_price: position(Field::LastTradePrice)?,
            max: position(Field::Max)?,
            min: position(Field::Min)?,
            volume: position(Field::Volume)?,
            turnover_best: position(Field::TurnoverBest)?,
        })
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::new(&default_columns()).expect("built-in column table is valid")
    }
}

/// Cell positions of the stored fields within one page's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub date: usize,
    pub last_trade_price: usize,
    pub max: usize,
    pub min: usize,
    pub volume: usize,
    pub turnover_best: usize,
}

impl ColumnIndex {
    /// Minimum number of cells a row needs to carry every field.
    pub fn width(&self) -> usize {
        [
            self.date,
            self.last_trade_price,
            self.max,
            self.min,
            self.volume,
            self.turnover_best,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_map_resolves_source_header() {
        let map = ColumnMap::default();
        let idx = map
            .resolve(&header(&[
                "Date",
                "Last trade price",
                "Max",
                "Min",
                "Avg. Price",
                "%chg.",
                "Volume",
                "Turnover in BEST in denars",
                "Total turnover in denars",
            ]))
            .unwrap();
        assert_eq!(idx.date, 0);
        assert_eq!(idx.last_trade_price, 1);
        assert_eq!(idx.volume, 6);
        assert_eq!(idx.turnover_best, 7);
        assert_eq!(idx.width(), 8);
    }

    #[test]
    fn dropped_columns_are_reported_as_drop() {
        let map = ColumnMap::default();
        assert_eq!(map.role_of("Avg. Price"), Some(ColumnRole::Drop));
        assert_eq!(map.role_of("%chg."), Some(ColumnRole::Drop));
        assert_eq!(
            map.role_of(" Volume "),
            Some(ColumnRole::Keep(Field::Volume))
        );
        assert_eq!(map.role_of("Unknown"), None);
    }

    #[test]
    fn renamed_header_fails_with_diagnostic() {
        let map = ColumnMap::default();
        let err = map
            .resolve(&header(&[
                "Date",
                "Last Trade Price",
                "Max",
                "Min",
                "Volume",
                "Turnover in BEST in denars",
            ]))
            .unwrap_err();
        match err {
            ColumnMapError::MissingColumn { label, field, .. } => {
                assert_eq!(label, "Last trade price");
                assert_eq!(field, Field::LastTradePrice);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut specs = default_columns();
        specs.push(ColumnSpec::drop("Date"));
        assert_eq!(
            ColumnMap::new(&specs).unwrap_err(),
            ColumnMapError::DuplicateLabel("Date".into())
        );
    }

    #[test]
    fn field_mapped_twice_is_rejected() {
        let mut specs = default_columns();
        specs.push(ColumnSpec::keep("Last price", Field::LastTradePrice));
        assert!(matches!(
            ColumnMap::new(&specs).unwrap_err(),
            ColumnMapError::DuplicateField {
                field: Field::LastTradePrice,
                ..
            }
        ));
    }

    #[test]
    fn unmapped_field_is_rejected() {
        let specs: Vec<ColumnSpec> = default_columns()
            .into_iter()
            .filter(|s| s.field != Some(Field::Min))
            .collect();
        assert_eq!(
            ColumnMap::new(&specs).unwrap_err(),
            ColumnMapError::UnmappedField(Field::Min)
        );
    }
}
