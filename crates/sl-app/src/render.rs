//! Text and JSON rendering of report tables

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow::util::pretty::pretty_format_batches;
use serde_json::{Map, Value};
use sl_core::Dataset;

/// Render a dataset as an ASCII table
pub fn table(dataset: &Dataset) -> Result<String> {
    let formatted = pretty_format_batches(&[dataset.batch().clone()])
        .context("Failed to format table")?;
    Ok(formatted.to_string())
}

/// Rows as JSON objects keyed by column name.
///
/// Integers, floats and booleans keep their JSON type; every other value
/// is rendered as text. Nulls stay null.
pub fn rows_as_json(dataset: &Dataset) -> Result<Vec<Map<String, Value>>> {
    let batch = dataset.batch();
    let names = dataset.column_names();
    let options = FormatOptions::default();
    let formatters = batch
        .columns()
        .iter()
        .map(|column| ArrayFormatter::try_new(column.as_ref(), &options))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to prepare value formatters")?;

    let rows = (0..batch.num_rows())
        .map(|row| {
            names
                .iter()
                .zip(batch.columns())
                .zip(&formatters)
                .map(|((name, column), formatter)| {
                    (name.clone(), cell_json(column, row, formatter))
                })
                .collect()
        })
        .collect();

    Ok(rows)
}

fn cell_json(column: &ArrayRef, row: usize, formatter: &ArrayFormatter<'_>) -> Value {
    if column.is_null(row) {
        return Value::Null;
    }

    let typed = match column.data_type() {
        DataType::Int64 => column
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| Value::from(a.value(row))),
        DataType::Float64 => column
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| serde_json::Number::from_f64(a.value(row)).map_or(Value::Null, Value::Number)),
        DataType::Boolean => column
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Bool(a.value(row))),
        _ => None,
    };
    typed.unwrap_or_else(|| Value::String(formatter.value(row).to_string()))
}
