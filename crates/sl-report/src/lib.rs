//! Tables derived from a loaded dataset
//!
//! Preview, per-column summary statistics, value counts and cross-tabs. Each
//! result can be turned back into a [`Dataset`] for display; nothing here
//! renders anything itself.

pub mod counts;
pub mod stats;

use arrow::error::ArrowError;
use sl_core::{ColumnKind, Dataset};
use thiserror::Error;

pub use counts::{crosstab, value_counts, CrossTab, GroupCounts, NULL_LABEL};
pub use stats::{describe, describe_table, ColumnSummary};

/// Errors raised while building report tables
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// First `rows` rows of the dataset
pub fn preview(dataset: &Dataset, rows: usize) -> Dataset {
    dataset.head(rows)
}

/// Names of the text columns, the natural candidates for grouping
pub fn categorical_columns(dataset: &Dataset) -> Vec<String> {
    dataset
        .column_names()
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| dataset.column_kind(*idx) == ColumnKind::Text)
        .map(|(_, name)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field};

    #[test]
    fn test_categorical_columns() {
        let ds = Dataset::try_from_columns(
            vec![
                Field::new("city", DataType::Utf8, true),
                Field::new("rate", DataType::Float64, true),
                Field::new("status", DataType::Utf8, true),
            ],
            vec![
                Arc::new(StringArray::from(vec!["a"])),
                Arc::new(Float64Array::from(vec![0.5])),
                Arc::new(StringArray::from(vec!["ok"])),
            ],
            1,
        )
        .unwrap();

        assert_eq!(categorical_columns(&ds), vec!["city", "status"]);
        assert_eq!(preview(&ds, 30).num_rows(), 1);
    }
}
