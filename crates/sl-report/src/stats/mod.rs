//! Per-column descriptive statistics

use std::sync::Arc;

use ahash::AHashMap;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use serde::Serialize;
use sl_core::{ColumnKind, Dataset};

use crate::ReportError;

/// Summary of one column, in the spirit of `describe(include="all")`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    /// Non-null values
    pub count: usize,
    /// Distinct non-null values (text, boolean and temporal columns)
    pub unique: Option<usize>,
    /// Most frequent value; ties go to the value seen first
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub numeric: Option<NumericStats>,
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub mean: f64,
    /// Sample standard deviation; undefined below two values
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Summarize every column of the dataset
pub fn describe(dataset: &Dataset) -> Result<Vec<ColumnSummary>, ReportError> {
    let batch = dataset.batch();
    let mut summaries = Vec::with_capacity(batch.num_columns());

    for (idx, field) in batch.schema().fields().iter().enumerate() {
        let column = batch.column(idx);
        let kind = ColumnKind::of(field.data_type());
        let mut summary = ColumnSummary {
            name: field.name().clone(),
            kind,
            count: column.len() - column.null_count(),
            unique: None,
            top: None,
            freq: None,
            numeric: None,
            earliest: None,
            latest: None,
        };

        // Calculate type-specific statistics
        if kind.is_numeric() {
            summary.numeric = numeric_stats(&float_values(column)?);
        } else if kind.is_temporal() {
            let (unique, earliest, latest) = temporal_stats(column)?;
            summary.unique = Some(unique);
            summary.earliest = earliest;
            summary.latest = latest;
        } else {
            let (unique, top) = frequency_stats(column)?;
            summary.unique = Some(unique);
            if let Some((value, freq)) = top {
                summary.top = Some(value);
                summary.freq = Some(freq);
            }
        }

        summaries.push(summary);
    }

    Ok(summaries)
}

/// Render summaries as a dataset with one row per column
pub fn describe_table(summaries: &[ColumnSummary]) -> Result<Dataset, ReportError> {
    let text = |f: &dyn Fn(&ColumnSummary) -> Option<String>| -> ArrayRef {
        Arc::new(summaries.iter().map(f).collect::<StringArray>())
    };
    let int = |f: &dyn Fn(&ColumnSummary) -> Option<i64>| -> ArrayRef {
        Arc::new(summaries.iter().map(f).collect::<Int64Array>())
    };
    let float = |f: &dyn Fn(&NumericStats) -> Option<f64>| -> ArrayRef {
        Arc::new(
            summaries
                .iter()
                .map(|s| s.numeric.as_ref().and_then(f))
                .collect::<Float64Array>(),
        )
    };

    let fields = vec![
        Field::new("column", DataType::Utf8, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("count", DataType::Int64, false),
        Field::new("unique", DataType::Int64, true),
        Field::new("top", DataType::Utf8, true),
        Field::new("freq", DataType::Int64, true),
        Field::new("mean", DataType::Float64, true),
        Field::new("std", DataType::Float64, true),
        Field::new("min", DataType::Utf8, true),
        Field::new("25%", DataType::Float64, true),
        Field::new("50%", DataType::Float64, true),
        Field::new("75%", DataType::Float64, true),
        Field::new("max", DataType::Utf8, true),
    ];
    let columns = vec![
        text(&|s| Some(s.name.clone())),
        text(&|s| Some(s.kind.label().to_string())),
        int(&|s| Some(s.count as i64)),
        int(&|s| s.unique.map(|u| u as i64)),
        text(&|s| s.top.clone()),
        int(&|s| s.freq.map(|f| f as i64)),
        float(&|n| Some(n.mean)),
        float(&|n| n.std),
        text(&|s| {
            s.numeric
                .as_ref()
                .map(|n| n.min.to_string())
                .or_else(|| s.earliest.clone())
        }),
        float(&|n| Some(n.q1)),
        float(&|n| Some(n.median)),
        float(&|n| Some(n.q3)),
        text(&|s| {
            s.numeric
                .as_ref()
                .map(|n| n.max.to_string())
                .or_else(|| s.latest.clone())
        }),
    ];

    Ok(Dataset::try_from_columns(fields, columns, summaries.len())?)
}

/// Non-null values of a numeric column as `f64`
fn float_values(column: &ArrayRef) -> Result<Vec<f64>, ReportError> {
    let cast_column = cast(column.as_ref(), &DataType::Float64)?;
    let array = cast_column
        .as_any()
        .downcast_ref::<Float64Array>()
        .map(|a| a.iter().flatten().filter(|v| !v.is_nan()).collect())
        .unwrap_or_default();
    Ok(array)
}

fn numeric_stats(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    } else {
        None
    };

    let (q1, median, q3) = calculate_quartiles(&sorted);

    Some(NumericStats {
        mean,
        std,
        min: sorted[0],
        q1,
        median,
        q3,
        max: sorted[sorted.len() - 1],
    })
}

/// Calculate quartiles of sorted values using linear interpolation
pub fn calculate_quartiles(sorted: &[f64]) -> (f64, f64, f64) {
    let n = sorted.len();
    if n == 0 {
        return (f64::NAN, f64::NAN, f64::NAN);
    }

    let q1 = interpolate(sorted, (n - 1) as f64 * 0.25);
    let q2 = interpolate(sorted, (n - 1) as f64 * 0.5);
    let q3 = interpolate(sorted, (n - 1) as f64 * 0.75);

    (q1, q2, q3)
}

fn interpolate(sorted: &[f64], idx: f64) -> f64 {
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;

    if lower == upper || upper >= sorted.len() {
        sorted[lower]
    } else {
        let fraction = idx - lower as f64;
        sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction
    }
}

/// Distinct count plus the most frequent display value and its count
fn frequency_stats(column: &ArrayRef) -> Result<(usize, Option<(String, usize)>), ReportError> {
    let formatter = ArrayFormatter::try_new(column.as_ref(), &FormatOptions::default())?;
    let mut counts: AHashMap<String, (usize, usize)> = AHashMap::new();

    for i in 0..column.len() {
        if column.is_null(i) {
            continue;
        }
        let seen = counts.len();
        let entry = counts.entry(formatter.value(i).to_string()).or_insert((0, seen));
        entry.0 += 1;
    }

    let top = counts
        .iter()
        .max_by(|(_, (count_a, order_a)), (_, (count_b, order_b))| {
            count_a.cmp(count_b).then(order_b.cmp(order_a))
        })
        .map(|(value, (count, _))| (value.clone(), *count));

    Ok((counts.len(), top))
}

/// Distinct count plus the formatted earliest and latest values
fn temporal_stats(column: &ArrayRef) -> Result<(usize, Option<String>, Option<String>), ReportError> {
    let raw = cast(column.as_ref(), &DataType::Int64)?;
    let raw = match raw.as_any().downcast_ref::<Int64Array>() {
        Some(raw) => raw.clone(),
        None => return Ok((0, None, None)),
    };
    let formatter = ArrayFormatter::try_new(column.as_ref(), &FormatOptions::default())?;

    let mut distinct = ahash::AHashSet::new();
    let mut earliest: Option<(i64, usize)> = None;
    let mut latest: Option<(i64, usize)> = None;

    for (i, value) in raw.iter().enumerate() {
        let Some(value) = value else { continue };
        distinct.insert(value);
        if earliest.map_or(true, |(v, _)| value < v) {
            earliest = Some((value, i));
        }
        if latest.map_or(true, |(v, _)| value > v) {
            latest = Some((value, i));
        }
    }

    let render = |slot: Option<(i64, usize)>| slot.map(|(_, i)| formatter.value(i).to_string());
    Ok((distinct.len(), render(earliest), render(latest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Date32Array};

    fn dataset() -> Dataset {
        Dataset::try_from_columns(
            vec![
                Field::new("status", DataType::Utf8, true),
                Field::new("score", DataType::Int64, true),
                Field::new("passed", DataType::Boolean, true),
                Field::new("day", DataType::Date32, true),
            ],
            vec![
                Arc::new(StringArray::from(vec![Some("b"), Some("a"), Some("a"), Some("b"), None])),
                Arc::new(Int64Array::from(vec![Some(1), Some(2), Some(3), Some(4), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false), Some(true), None, None])),
                Arc::new(Date32Array::from(vec![Some(10), Some(0), None, Some(365), Some(10)])),
            ],
            5,
        )
        .unwrap()
    }

    #[test]
    fn test_text_summary() {
        let summaries = describe(&dataset()).unwrap();
        let status = &summaries[0];

        assert_eq!(status.count, 4);
        assert_eq!(status.unique, Some(2));
        // "b" and "a" tie; "b" was seen first
        assert_eq!(status.top.as_deref(), Some("b"));
        assert_eq!(status.freq, Some(2));
        assert!(status.numeric.is_none());
    }

    #[test]
    fn test_numeric_summary() {
        let summaries = describe(&dataset()).unwrap();
        let score = summaries[1].numeric.as_ref().unwrap();

        assert_eq!(summaries[1].count, 4);
        assert_eq!(score.mean, 2.5);
        assert!((score.std.unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(score.min, 1.0);
        assert_eq!(score.q1, 1.75);
        assert_eq!(score.median, 2.5);
        assert_eq!(score.q3, 3.25);
        assert_eq!(score.max, 4.0);
    }

    #[test]
    fn test_boolean_and_date_summary() {
        let summaries = describe(&dataset()).unwrap();

        assert_eq!(summaries[2].top.as_deref(), Some("true"));
        assert_eq!(summaries[2].freq, Some(2));

        let day = &summaries[3];
        assert_eq!(day.count, 4);
        assert_eq!(day.unique, Some(3));
        assert_eq!(day.earliest.as_deref(), Some("1970-01-01"));
        assert_eq!(day.latest.as_deref(), Some("1971-01-01"));
    }

    #[test]
    fn test_single_value_has_no_std() {
        assert_eq!(numeric_stats(&[5.0]).unwrap().std, None);
        assert!(numeric_stats(&[]).is_none());
    }

    #[test]
    fn test_describe_table_shape() {
        let table = describe_table(&describe(&dataset()).unwrap()).unwrap();

        assert_eq!(table.num_rows(), 4);
        assert_eq!(table.column_names()[0], "column");
        let min = table.column("min").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
        assert!(min.is_null(0));
        assert_eq!(min.value(1), "1");
        assert_eq!(min.value(3), "1970-01-01");
    }
}
