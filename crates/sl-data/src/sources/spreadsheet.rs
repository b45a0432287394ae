//! Workbook reader (xlsx, xlsm, xlsb, xls, ods)

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::*;
use arrow::datatypes::Field;
use calamine::{open_workbook_auto_from_rs, Data, DataType as CellType, Range, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use sl_core::{ColumnKind, Dataset, SheetSelector};
use tracing::debug;

use crate::schema::{arrow_type, date_to_days, datetime_to_millis, parse_datetime};
use crate::DataError;

/// Reads one sheet of a workbook; the first row is the header
pub struct SpreadsheetReader;

impl SpreadsheetReader {
    /// Open a workbook from memory and read the selected sheet
    pub fn read(bytes: &[u8], sheet: &SheetSelector) -> Result<Dataset, DataError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(DataError::Spreadsheet("workbook has no worksheets".to_string()));
        }

        let range = match sheet {
            SheetSelector::Index(idx) => workbook
                .worksheet_range_at(*idx)
                .ok_or_else(|| DataError::SheetNotFound(sheet.to_string()))??,
            SheetSelector::Name(name) => {
                if !sheet_names.iter().any(|n| n == name) {
                    return Err(DataError::SheetNotFound(sheet.to_string()));
                }
                workbook.worksheet_range(name)?
            }
        };
        debug!("Read sheet {} with {:?} cells", sheet, range.get_size());

        Self::range_to_dataset(&range)
    }

    fn range_to_dataset(range: &Range<Data>) -> Result<Dataset, DataError> {
        let mut rows = range.rows();
        let header_row = rows.next().ok_or(DataError::Empty)?;
        let headers: Vec<String> = header_row.iter().map(header_text).collect();
        let body: Vec<&[Data]> = rows.collect();

        let mut fields = Vec::with_capacity(headers.len());
        let mut arrays = Vec::with_capacity(headers.len());
        for (col_idx, header) in headers.iter().enumerate() {
            let cells: Vec<Option<&Data>> = body.iter().map(|row| row.get(col_idx)).collect();
            let kind = infer_cell_kind(&cells);
            fields.push(Field::new(header, arrow_type(kind), true));
            arrays.push(build_cell_array(&cells, kind));
        }

        Ok(Dataset::try_from_columns(fields, arrays, body.len())?)
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_missing(cell: &Data) -> bool {
    matches!(cell, Data::Empty | Data::Error(_)) || matches!(cell, Data::String(s) if s.trim().is_empty())
}

/// Datetime of an Excel date cell, an ISO datetime cell, or a parseable string
fn cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => cell.as_datetime(),
        Data::String(s) => parse_datetime(s),
        _ => None,
    }
}

/// Infer a column kind from typed cells.
///
/// Strings make the column text unless every one of them parses as a date;
/// whole-number floats count as integers.
fn infer_cell_kind(cells: &[Option<&Data>]) -> ColumnKind {
    let mut has_string = false;
    let mut has_int = false;
    let mut has_float = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    let mut has_other = false;

    for cell in cells.iter().flatten().filter(|c| !is_missing(c)) {
        match cell {
            Data::String(_) => has_string = true,
            Data::Int(_) => has_int = true,
            Data::Float(_) => has_float = true,
            Data::Bool(_) => has_bool = true,
            Data::DateTime(_) | Data::DateTimeIso(_) => has_datetime = true,
            _ => has_other = true,
        }
    }

    let numeric = has_int || has_float;
    let temporal_kind = || {
        let midnight = NaiveTime::MIN;
        let all_midnight = cells
            .iter()
            .flatten()
            .filter_map(|c| cell_datetime(c))
            .all(|dt| dt.time() == midnight);
        if all_midnight {
            ColumnKind::Date
        } else {
            ColumnKind::DateTime
        }
    };

    if has_other {
        ColumnKind::Text
    } else if has_string {
        let all_temporal = !numeric
            && !has_bool
            && cells
                .iter()
                .flatten()
                .filter(|c| !is_missing(c))
                .all(|c| cell_datetime(c).is_some());
        if all_temporal {
            temporal_kind()
        } else {
            ColumnKind::Text
        }
    } else if has_bool {
        if numeric || has_datetime {
            ColumnKind::Text
        } else {
            ColumnKind::Boolean
        }
    } else if has_datetime {
        if numeric {
            ColumnKind::Text
        } else {
            temporal_kind()
        }
    } else if numeric {
        let all_whole = cells.iter().flatten().all(|cell| match cell {
            Data::Float(f) => f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            _ => true,
        });
        if all_whole {
            ColumnKind::Integer
        } else {
            ColumnKind::Float
        }
    } else {
        ColumnKind::Text
    }
}

fn build_cell_array(cells: &[Option<&Data>], kind: ColumnKind) -> ArrayRef {
    let present = |c: &Option<&Data>| -> Option<Data> {
        c.filter(|cell| !is_missing(cell)).cloned()
    };

    match kind {
        ColumnKind::Integer => {
            let values: Int64Array = cells
                .iter()
                .map(|c| match present(c)? {
                    Data::Int(i) => Some(i),
                    Data::Float(f) => Some(f as i64),
                    _ => None,
                })
                .collect();
            Arc::new(values)
        }
        ColumnKind::Float => {
            let values: Float64Array = cells
                .iter()
                .map(|c| match present(c)? {
                    Data::Int(i) => Some(i as f64),
                    Data::Float(f) => Some(f),
                    _ => None,
                })
                .collect();
            Arc::new(values)
        }
        ColumnKind::Boolean => {
            let values: BooleanArray = cells
                .iter()
                .map(|c| present(c).and_then(|cell| cell.get_bool()))
                .collect();
            Arc::new(values)
        }
        ColumnKind::Date => {
            let values: Date32Array = cells
                .iter()
                .map(|c| present(c).and_then(|cell| cell_datetime(&cell)).map(|dt| date_to_days(dt.date())))
                .collect();
            Arc::new(values)
        }
        ColumnKind::DateTime => {
            let values: TimestampMillisecondArray = cells
                .iter()
                .map(|c| present(c).and_then(|cell| cell_datetime(&cell)).map(datetime_to_millis))
                .collect();
            Arc::new(values)
        }
        ColumnKind::Text | ColumnKind::Other => {
            let values: StringArray = cells
                .iter()
                .map(|c| {
                    present(c).map(|cell| match cell {
                        Data::String(s) => s,
                        other => other.to_string(),
                    })
                })
                .collect();
            Arc::new(values)
        }
    }
}
