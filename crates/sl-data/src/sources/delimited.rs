//! Delimited-text reader with separator fallback

use csv::ReaderBuilder;
use sl_core::Dataset;
use tracing::debug;

use crate::config::NullConfig;
use crate::schema::SchemaDetector;
use crate::DataError;

/// Separator tried first
pub const DEFAULT_DELIMITER: u8 = b',';

/// Separator tried when the default one does not split the header
pub const FALLBACK_DELIMITER: u8 = b';';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads comma separated text, retrying with semicolons when the comma
/// parse fails or yields a single column.
pub struct DelimitedReader<'a> {
    null_config: &'a NullConfig,
}

impl<'a> DelimitedReader<'a> {
    pub fn new(null_config: &'a NullConfig) -> Self {
        Self { null_config }
    }

    /// Parse with the default delimiter, falling back to the alternate one.
    ///
    /// A one-column comma parse is only replaced when the semicolon parse
    /// yields more columns, so genuinely single-column files still load.
    pub fn read(&self, bytes: &[u8]) -> Result<Dataset, DataError> {
        let first = self.read_with_delimiter(bytes, DEFAULT_DELIMITER);

        match first {
            Ok(dataset) if dataset.num_columns() > 1 => Ok(dataset),
            Ok(dataset) => {
                debug!("Comma parse produced a single column, retrying with ';'");
                match self.read_with_delimiter(bytes, FALLBACK_DELIMITER) {
                    Ok(retry) if retry.num_columns() > 1 => Ok(retry),
                    _ => Ok(dataset),
                }
            }
            Err(comma_err) => {
                debug!("Comma parse failed ({}), retrying with ';'", comma_err);
                match self.read_with_delimiter(bytes, FALLBACK_DELIMITER) {
                    Ok(retry) if retry.num_columns() > 1 => Ok(retry),
                    Ok(_) => Err(DataError::Csv(format!(
                        "',' parse: {}; ';' parse: single column",
                        comma_err
                    ))),
                    Err(DataError::Empty) if matches!(comma_err, DataError::Empty) => {
                        Err(DataError::Empty)
                    }
                    Err(semi_err) => Err(DataError::Csv(format!(
                        "',' parse: {}; ';' parse: {}",
                        comma_err, semi_err
                    ))),
                }
            }
        }
    }

    /// Parse with a single, fixed delimiter.
    ///
    /// The first record is the header and every record must have the same
    /// number of fields.
    pub fn read_with_delimiter(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset, DataError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        // Get headers
        let headers: Vec<String> = csv_reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() {
            return Err(DataError::Empty);
        }

        // Column-major cells
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut row_count = 0;
        for result in csv_reader.records() {
            let record = result?;
            for (column, value) in columns.iter_mut().zip(record.iter()) {
                column.push(value.to_string());
            }
            row_count += 1;
        }

        SchemaDetector::new(self.null_config).build_dataset(&headers, &columns, row_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};

    fn reader_read(bytes: &[u8]) -> Result<Dataset, DataError> {
        let nulls = NullConfig::default();
        DelimitedReader::new(&nulls).read(bytes)
    }

    #[test]
    fn test_comma_column_count_matches_header() {
        let ds = reader_read(b"a,b,c\n1,2,3\n4,5,6\n").unwrap();

        assert_eq!(ds.num_columns(), 3);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.column_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_semicolon_fallback() {
        let ds = reader_read(b"X;Y\nfoo;1\nbar;2\n").unwrap();

        assert_eq!(ds.column_names(), vec!["X", "Y"]);
        let y = ds.column("Y").unwrap().as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(y.values().to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_semicolon_fallback_after_ragged_comma_parse() {
        // Decimal commas make the comma parse ragged
        let ds = reader_read(b"name;value\nx;1,5\ny;2,25\n").unwrap();

        assert_eq!(ds.column_names(), vec!["name", "value"]);
        let value = ds.column("value").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(value.value(0), "1,5");
    }

    #[test]
    fn test_single_column_file_loads() {
        let ds = reader_read(b"city\nParis\nLyon\n").unwrap();

        assert_eq!(ds.num_columns(), 1);
        assert_eq!(ds.num_rows(), 2);
    }

    #[test]
    fn test_header_only() {
        let ds = reader_read(b"a,b\n").unwrap();

        assert_eq!(ds.num_columns(), 2);
        assert_eq!(ds.num_rows(), 0);
    }

    #[test]
    fn test_bom_is_stripped() {
        let ds = reader_read(b"\xEF\xBB\xBFa,b\n1,2\n").unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(reader_read(b""), Err(DataError::Empty)));
    }

    #[test]
    fn test_ragged_under_both_delimiters_is_rejected() {
        let err = reader_read(b"a,b\n1,2,3\n").unwrap_err();

        assert!(matches!(err, DataError::Csv(_)));
        assert!(err.to_string().contains("';' parse"));
    }

    #[test]
    fn test_nulls_in_numeric_column() {
        let ds = reader_read(b"a,b\n1,x\nNA,y\n").unwrap();
        let a = ds.column("a").unwrap();

        assert_eq!(a.null_count(), 1);
        assert_eq!(a.len(), 2);
    }
}
