//! Row counts per category and per category pair

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::AHashMap;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use serde::Serialize;
use sl_core::{ColumnKind, Dataset};

use crate::ReportError;

/// Label used for missing values in counts
pub const NULL_LABEL: &str = "(null)";

/// Number of rows per distinct value of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCounts {
    pub column: String,
    pub entries: Vec<(String, usize)>,
}

impl GroupCounts {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Two columns: the grouped column and `count`
    pub fn to_dataset(&self) -> Result<Dataset, ReportError> {
        let labels: ArrayRef = Arc::new(
            self.entries
                .iter()
                .map(|(label, _)| Some(label.as_str()))
                .collect::<StringArray>(),
        );
        let counts: ArrayRef = Arc::new(
            self.entries
                .iter()
                .map(|(_, count)| *count as i64)
                .collect::<Int64Array>(),
        );
        Ok(Dataset::try_from_columns(
            vec![
                Field::new(self.column.as_str(), DataType::Utf8, false),
                Field::new("count", DataType::Int64, false),
            ],
            vec![labels, counts],
            self.entries.len(),
        )?)
    }
}

/// Counts for each pair of values of two columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_column: String,
    pub col_column: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `counts[row][col]`; pairs that never occur are 0
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn get(&self, row: &str, col: &str) -> usize {
        let r = self.rows.iter().position(|label| label == row);
        let c = self.columns.iter().position(|label| label == col);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    /// Occurring pairs as `(row, col, count)`
    pub fn to_long(&self) -> Vec<(String, String, usize)> {
        let mut long = Vec::new();
        for (r, row) in self.rows.iter().enumerate() {
            for (c, col) in self.columns.iter().enumerate() {
                let count = self.counts[r][c];
                if count > 0 {
                    long.push((row.clone(), col.clone(), count));
                }
            }
        }
        long
    }

    /// Pivot table: the row column followed by one count column per value
    /// of the other column
    pub fn to_dataset(&self) -> Result<Dataset, ReportError> {
        let mut fields = vec![Field::new(self.row_column.as_str(), DataType::Utf8, false)];
        let mut arrays: Vec<ArrayRef> = vec![Arc::new(
            self.rows
                .iter()
                .map(|label| Some(label.as_str()))
                .collect::<StringArray>(),
        )];

        for (c, col) in self.columns.iter().enumerate() {
            fields.push(Field::new(col.as_str(), DataType::Int64, false));
            arrays.push(Arc::new(
                self.counts
                    .iter()
                    .map(|row| row[c] as i64)
                    .collect::<Int64Array>(),
            ));
        }

        Ok(Dataset::try_from_columns(fields, arrays, self.rows.len())?)
    }
}

/// Count rows per display value of `column`, nulls included
pub fn value_counts(dataset: &Dataset, column: &str) -> Result<GroupCounts, ReportError> {
    let keys = column_keys(dataset, column)?;
    let mut counts: AHashMap<usize, usize> = AHashMap::new();
    let mut order = KeyOrder::default();

    for key in &keys {
        let slot = order.slot(key);
        *counts.entry(slot).or_insert(0) += 1;
    }

    let entries = order
        .sorted()
        .into_iter()
        .map(|(slot, key)| (key.label.clone(), counts.get(&slot).copied().unwrap_or(0)))
        .collect();

    Ok(GroupCounts {
        column: column.to_string(),
        entries,
    })
}

/// Count rows per `(x, by)` value pair, nulls included
pub fn crosstab(dataset: &Dataset, x: &str, by: &str) -> Result<CrossTab, ReportError> {
    let row_keys = column_keys(dataset, x)?;
    let col_keys = column_keys(dataset, by)?;

    let mut row_order = KeyOrder::default();
    let mut col_order = KeyOrder::default();
    let mut pairs: AHashMap<(usize, usize), usize> = AHashMap::new();

    for (row_key, col_key) in row_keys.iter().zip(&col_keys) {
        let pair = (row_order.slot(row_key), col_order.slot(col_key));
        *pairs.entry(pair).or_insert(0) += 1;
    }

    let rows = row_order.sorted();
    let columns = col_order.sorted();
    let counts = rows
        .iter()
        .map(|(r, _)| {
            columns
                .iter()
                .map(|(c, _)| pairs.get(&(*r, *c)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Ok(CrossTab {
        row_column: x.to_string(),
        col_column: by.to_string(),
        rows: rows.into_iter().map(|(_, key)| key.label.clone()).collect(),
        columns: columns.into_iter().map(|(_, key)| key.label.clone()).collect(),
        counts,
    })
}

/// Display label of a cell plus a numeric ordering key where one exists
#[derive(Debug, Clone, PartialEq)]
struct Key {
    label: String,
    number: Option<f64>,
    null: bool,
}

impl Key {
    fn compare(&self, other: &Key) -> Ordering {
        // Nulls sort last
        self.null.cmp(&other.null).then_with(|| match (self.number, other.number) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => self.label.cmp(&other.label),
        })
    }
}

/// Assigns a slot to every distinct value; a null never shares a slot
/// with a text cell that happens to read like the null label
#[derive(Default)]
struct KeyOrder {
    slots: AHashMap<(bool, String), usize>,
    keys: Vec<Key>,
}

impl KeyOrder {
    fn slot(&mut self, key: &Key) -> usize {
        let id = (key.null, key.label.clone());
        if let Some(slot) = self.slots.get(&id) {
            return *slot;
        }
        let slot = self.keys.len();
        self.slots.insert(id, slot);
        self.keys.push(key.clone());
        slot
    }

    fn sorted(&self) -> Vec<(usize, &Key)> {
        let mut sorted: Vec<(usize, &Key)> = self.keys.iter().enumerate().collect();
        sorted.sort_by(|(_, a), (_, b)| a.compare(b));
        sorted
    }
}

fn column_keys(dataset: &Dataset, name: &str) -> Result<Vec<Key>, ReportError> {
    let idx = dataset
        .column_index(name)
        .ok_or_else(|| ReportError::UnknownColumn(name.to_string()))?;
    let column = dataset.batch().column(idx);
    let kind = dataset.column_kind(idx);

    let formatter = ArrayFormatter::try_new(column.as_ref(), &FormatOptions::default())?;
    let numbers = ordering_numbers(column, kind)?;

    let keys = (0..column.len())
        .map(|i| {
            if column.is_null(i) {
                Key {
                    label: NULL_LABEL.to_string(),
                    number: None,
                    null: true,
                }
            } else {
                Key {
                    label: formatter.value(i).to_string(),
                    number: numbers.as_ref().and_then(|n| n.is_valid(i).then(|| n.value(i))),
                    null: false,
                }
            }
        })
        .collect();

    Ok(keys)
}

/// Numeric view used for ordering numeric and temporal columns
fn ordering_numbers(column: &ArrayRef, kind: ColumnKind) -> Result<Option<Float64Array>, ReportError> {
    let as_float = if kind.is_numeric() {
        cast(column.as_ref(), &DataType::Float64)?
    } else if kind.is_temporal() {
        let raw = cast(column.as_ref(), &DataType::Int64)?;
        cast(raw.as_ref(), &DataType::Float64)?
    } else {
        return Ok(None);
    };

    Ok(as_float.as_any().downcast_ref::<Float64Array>().cloned())
}
