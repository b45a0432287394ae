//! Column type inference for text-based sources

use std::sync::Arc;

use arrow::array::*;
use arrow::datatypes::{DataType, Field, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};
use sl_core::{ColumnKind, Dataset};

use crate::config::NullConfig;
use crate::DataError;

/// Datetime layouts recognised in text cells, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date layout recognised in text cells
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO date (no time part)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Parse an ISO datetime; a bare date is read as midnight
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date(value).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Days since the Unix epoch, as stored by `Date32`
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

/// Milliseconds since the Unix epoch, as stored by `Timestamp(ms)`
pub fn datetime_to_millis(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

/// Arrow type used to store a column of the given kind
pub fn arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Integer => DataType::Int64,
        ColumnKind::Float => DataType::Float64,
        ColumnKind::Boolean => DataType::Boolean,
        ColumnKind::Date => DataType::Date32,
        ColumnKind::DateTime => DataType::Timestamp(TimeUnit::Millisecond, None),
        ColumnKind::Text | ColumnKind::Other => DataType::Utf8,
    }
}

/// Schema detector for analyzing text cells and determining column types
pub struct SchemaDetector<'a> {
    null_config: &'a NullConfig,
}

impl<'a> SchemaDetector<'a> {
    /// Create a new schema detector
    pub fn new(null_config: &'a NullConfig) -> Self {
        Self { null_config }
    }

    /// Build a dataset from a header and column-major text cells
    pub fn build_dataset(
        &self,
        headers: &[String],
        columns: &[Vec<String>],
        row_count: usize,
    ) -> Result<Dataset, DataError> {
        let mut fields = Vec::with_capacity(headers.len());
        let mut arrays = Vec::with_capacity(headers.len());

        for (header, values) in headers.iter().zip(columns) {
            let kind = self.detect_kind(values);
            fields.push(Field::new(header, arrow_type(kind), true));
            arrays.push(self.build_array(values, kind));
        }

        Ok(Dataset::try_from_columns(fields, arrays, row_count)?)
    }

    /// Detect the kind of a column from its cells.
    ///
    /// Null cells are ignored; a column holding nothing but nulls is text.
    pub fn detect_kind(&self, values: &[String]) -> ColumnKind {
        let mut seen = false;
        let mut is_bool = true;
        let mut is_int = true;
        let mut is_float = true;
        let mut is_date = true;
        let mut is_datetime = true;

        for value in values {
            if self.null_config.is_null(value) {
                continue;
            }
            seen = true;
            let value = value.trim();

            // Type checks
            if is_bool && parse_bool(value).is_none() {
                is_bool = false;
            }
            if is_int && value.parse::<i64>().is_err() {
                is_int = false;
            }
            if is_float && value.parse::<f64>().is_err() {
                is_float = false;
            }
            if is_date && parse_date(value).is_none() {
                is_date = false;
            }
            if is_datetime && parse_datetime(value).is_none() {
                is_datetime = false;
            }

            if !(is_bool || is_int || is_float || is_date || is_datetime) {
                break;
            }
        }

        if !seen {
            ColumnKind::Text
        } else if is_bool {
            ColumnKind::Boolean
        } else if is_int {
            ColumnKind::Integer
        } else if is_float {
            ColumnKind::Float
        } else if is_date {
            ColumnKind::Date
        } else if is_datetime {
            ColumnKind::DateTime
        } else {
            ColumnKind::Text
        }
    }

    /// Build an arrow array of the given kind from text cells
    pub fn build_array(&self, values: &[String], kind: ColumnKind) -> ArrayRef {
        let cell = |value: &String| -> Option<String> {
            if self.null_config.is_null(value) {
                None
            } else {
                Some(value.trim().to_string())
            }
        };

        match kind {
            ColumnKind::Integer => {
                let mut builder = Int64Builder::with_capacity(values.len());
                for value in values {
                    builder.append_option(cell(value).and_then(|v| v.parse::<i64>().ok()));
                }
                Arc::new(builder.finish())
            }
            ColumnKind::Float => {
                let mut builder = Float64Builder::with_capacity(values.len());
                for value in values {
                    builder.append_option(cell(value).and_then(|v| v.parse::<f64>().ok()));
                }
                Arc::new(builder.finish())
            }
            ColumnKind::Boolean => {
                let mut builder = BooleanBuilder::with_capacity(values.len());
                for value in values {
                    builder.append_option(cell(value).and_then(|v| parse_bool(&v)));
                }
                Arc::new(builder.finish())
            }
            ColumnKind::Date => {
                let mut builder = Date32Builder::with_capacity(values.len());
                for value in values {
                    builder.append_option(cell(value).and_then(|v| parse_date(&v)).map(date_to_days));
                }
                Arc::new(builder.finish())
            }
            ColumnKind::DateTime => {
                let mut builder = TimestampMillisecondBuilder::with_capacity(values.len());
                for value in values {
                    builder.append_option(
                        cell(value)
                            .and_then(|v| parse_datetime(&v))
                            .map(datetime_to_millis),
                    );
                }
                Arc::new(builder.finish())
            }
            ColumnKind::Text | ColumnKind::Other => {
                // Text keeps the raw cell; trimming is normalization's job
                let mut builder = StringBuilder::new();
                for value in values {
                    if self.null_config.is_null(value) {
                        builder.append_null();
                    } else {
                        builder.append_value(value);
                    }
                }
                Arc::new(builder.finish())
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
